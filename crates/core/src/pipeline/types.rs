//! Types for pipeline job submission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything needed to launch one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Client-chosen run id, unique per submission.
    pub job_id: String,
    pub display_name: String,
    pub template_uri: String,
    pub parameter_values: BTreeMap<String, serde_json::Value>,
    pub enable_caching: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
}

impl JobRequest {
    /// Look up a parameter value by key.
    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameter_values.get(key)
    }
}

/// Acknowledgement of a submitted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    /// Fully qualified resource name, e.g.
    /// `projects/p/locations/r/pipelineJobs/{job_id}`.
    pub resource_name: String,
    pub display_name: String,
}
