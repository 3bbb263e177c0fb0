pub mod config;
pub mod history;
pub mod metrics;
pub mod pipeline;
pub mod storage;
pub mod testing;
pub mod trigger;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DuplicatePolicy,
    GcpConfig, PipelineConfig, SanitizedConfig, ServerConfig, StorageConfig, TriggerConfig,
};
pub use history::{TriggerHistory, TriggerRecord, STATUS_TRIGGERED};
pub use pipeline::{JobHandle, JobRequest, PipelineError, PipelineService, VertexPipelineClient};
pub use storage::{
    gcs_uri, stage_upload, staged_object_path, GcsObjectStore, ObjectStore, StagedObject,
    StorageError,
};
pub use trigger::{
    console_link, customer_name, TriggerError, TriggerOptions, TriggerOrchestrator,
    TriggerOutcome, TriggerSettings, Upload,
};
