//! Names, identifiers and links derived from an upload.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Longest id the pipeline API accepts.
const MAX_JOB_ID_LEN: usize = 128;

static JOB_ID_INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9-]+").unwrap());

/// Customer name for an uploaded file: the filename minus its last extension.
///
/// Leading dots do not start an extension, so `.hidden` stays `.hidden`.
pub fn customer_name(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if filename[..idx].chars().any(|c| c != '.') => &filename[..idx],
        _ => filename,
    }
}

/// Display name of the pipeline run, `{prefix}-{customer}[-{YYYYMMDD}]`.
pub fn job_display_name(prefix: &str, customer_name: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("{}-{}-{}", prefix, customer_name, date.format("%Y%m%d")),
        None => format!("{}-{}", prefix, customer_name),
    }
}

/// Run id for a display name, unique to the millisecond.
///
/// The display name is lowercased and every run of characters outside
/// `[a-z0-9-]` becomes a single `-`; a timestamp suffix is appended and the
/// result is kept within 128 characters and starts with a letter.
pub fn pipeline_job_id(display_name: &str, now: DateTime<Utc>) -> String {
    let lowered = display_name.to_lowercase();
    let sanitized = JOB_ID_INVALID.replace_all(&lowered, "-");
    let mut base = sanitized.trim_matches('-').to_string();
    if !base.starts_with(|c: char| c.is_ascii_lowercase()) {
        base.insert_str(0, "job-");
    }

    let suffix = now.format("%Y%m%d%H%M%S%3f").to_string();
    let max_base = MAX_JOB_ID_LEN - suffix.len() - 1;
    if base.len() > max_base {
        // Only ASCII remains after sanitizing, so byte truncation is safe.
        base.truncate(max_base);
    }
    let base = base.trim_end_matches('-');

    format!("{}-{}", base, suffix)
}

/// Training budget in milli node hours, truncating fractions (2.5 h -> 2500).
pub fn training_budget_milli_node_hours(hours: f64) -> i64 {
    (hours * 1000.0) as i64
}

/// Console page for a submitted run.
pub fn console_link(region: &str, job_id: &str, project: &str) -> String {
    format!(
        "https://console.cloud.google.com/vertex-ai/locations/{}/pipelines/runs/{}?project={}",
        region, job_id, project
    )
}
