//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits,
//! allowing the orchestrator and the HTTP API to be tested without a cloud
//! project.
//!
//! # Example
//!
//! ```rust,ignore
//! use napex_core::testing::{MockObjectStore, MockPipelineService};
//!
//! let store = Arc::new(MockObjectStore::new("ncms-cashflow"));
//! let pipelines = Arc::new(MockPipelineService::new());
//!
//! let orchestrator = TriggerOrchestrator::new(settings, store.clone(), pipelines.clone());
//! let (history, result) = orchestrator.trigger(history, uploads, &options).await;
//!
//! assert_eq!(pipelines.submission_count().await, 1);
//! ```

mod mock_object_store;
mod mock_pipeline;

pub use mock_object_store::{MockObjectStore, RecordedUpload};
pub use mock_pipeline::{MockPipelineService, RecordedSubmission};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{
        Config, GcpConfig, PipelineConfig, ServerConfig, StorageConfig, TriggerConfig,
    };
    use crate::trigger::{TriggerSettings, Upload};

    pub const PROJECT: &str = "ncms-forecasting";
    pub const REGION: &str = "us-central1";
    pub const BUCKET: &str = "ncms-cashflow";
    pub const TEMPLATE: &str = "gs://ncms-cashflow/templates/automl-forecasting.json";

    /// Configuration pointing at the fixture project.
    pub fn config(trigger: TriggerConfig) -> Config {
        Config {
            gcp: GcpConfig {
                project_id: PROJECT.to_string(),
                region: REGION.to_string(),
                bucket_name: BUCKET.to_string(),
                pipeline_template_path: TEMPLATE.to_string(),
                service_account: None,
                access_token: None,
            },
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            pipeline: PipelineConfig::default(),
            trigger,
        }
    }

    pub fn settings(trigger: TriggerConfig) -> TriggerSettings {
        TriggerSettings::from(&config(trigger))
    }

    /// A small cashflow CSV for the given customer.
    pub fn cashflow_csv(customer: &str) -> Upload {
        Upload::new(
            format!("{}.csv", customer),
            format!(
                "date,customer,net_cashflow\n2024-01-31,{c},1200.50\n2024-02-29,{c},-310.00\n",
                c = customer
            ),
        )
    }
}
