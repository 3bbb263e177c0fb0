//! Types for trigger orchestration.

use serde::{Deserialize, Serialize};

use crate::config::{Config, TriggerConfig};

use super::TriggerError;

/// Smallest accepted training budget in hours.
pub const MIN_TRAINING_BUDGET_HOURS: f64 = 1.0;
/// Largest accepted training budget in hours.
pub const MAX_TRAINING_BUDGET_HOURS: f64 = 100.0;

/// A file submitted by the user.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// User-chosen options applied to every file in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerOptions {
    pub training_budget_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_horizon: Option<u32>,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            training_budget_hours: MIN_TRAINING_BUDGET_HOURS,
            forecast_horizon: None,
        }
    }
}

impl TriggerOptions {
    pub fn validate(&self) -> Result<(), TriggerError> {
        let hours = self.training_budget_hours;
        if !hours.is_finite() || !(MIN_TRAINING_BUDGET_HOURS..=MAX_TRAINING_BUDGET_HOURS).contains(&hours) {
            return Err(TriggerError::InvalidOptions(format!(
                "training budget must be between {} and {} hours, got {}",
                MIN_TRAINING_BUDGET_HOURS, MAX_TRAINING_BUDGET_HOURS, hours
            )));
        }
        if self.forecast_horizon == Some(0) {
            return Err(TriggerError::InvalidOptions(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deployment-wide values every job request is built from.
#[derive(Debug, Clone)]
pub struct TriggerSettings {
    pub project_id: String,
    pub region: String,
    pub bucket_name: String,
    pub template_uri: String,
    pub service_account: Option<String>,
    pub trigger: TriggerConfig,
}

impl From<&Config> for TriggerSettings {
    fn from(config: &Config) -> Self {
        Self {
            project_id: config.gcp.project_id.clone(),
            region: config.gcp.region.clone(),
            bucket_name: config.gcp.bucket_name.clone(),
            template_uri: config.gcp.pipeline_template_path.clone(),
            service_account: config
                .gcp
                .service_account
                .clone()
                .filter(|s| !s.is_empty()),
            trigger: config.trigger.clone(),
        }
    }
}

/// What happened to one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerOutcome {
    Triggered {
        filename: String,
        customer_name: String,
        gcs_uri: String,
        job_id: String,
        display_name: String,
        link: String,
    },
    /// The customer was already triggered in this session.
    SkippedDuplicate {
        filename: String,
        customer_name: String,
    },
}

impl TriggerOutcome {
    pub fn customer_name(&self) -> &str {
        match self {
            Self::Triggered { customer_name, .. } | Self::SkippedDuplicate { customer_name, .. } => {
                customer_name
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered { .. })
    }

    /// Metric label for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered { .. } => "triggered",
            Self::SkippedDuplicate { .. } => "skipped_duplicate",
        }
    }
}
