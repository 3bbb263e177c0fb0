//! Session-scoped trigger history.
//!
//! The history is a plain value owned by the caller. The orchestrator takes it
//! in and hands it back; nothing here is shared or persisted.

use serde::{Deserialize, Serialize};

/// Status label recorded for a submitted pipeline run.
pub const STATUS_TRIGGERED: &str = "Triggered";

/// CSV header row of an exported history.
pub const CSV_HEADER: &str = "customer,status,link";

/// One triggered customer file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub customer_name: String,
    pub status: String,
    pub link: String,
}

impl TriggerRecord {
    pub fn triggered(customer_name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            status: STATUS_TRIGGERED.to_string(),
            link: link.into(),
        }
    }
}

/// Ordered list of records for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerHistory {
    records: Vec<TriggerRecord>,
}

impl TriggerHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TriggerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a run was already recorded for this customer.
    pub fn contains(&self, customer_name: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.customer_name == customer_name)
    }

    pub fn add(&mut self, record: TriggerRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Render the history as CSV with a `customer,status,link` header.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() + 1 + self.records.len() * 128);
        out.push_str(CSV_HEADER);
        out.push('\n');
        for record in &self.records {
            out.push_str(&csv_field(&record.customer_name));
            out.push(',');
            out.push_str(&csv_field(&record.status));
            out.push(',');
            out.push_str(&csv_field(&record.link));
            out.push('\n');
        }
        out
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}
