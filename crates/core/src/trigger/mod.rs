//! Upload-and-trigger orchestration.
//!
//! For every uploaded file the orchestrator:
//! 1. derives the customer name from the filename
//! 2. stages the bytes at `uploads/{filename}` in the bucket
//! 3. builds and submits one pipeline job request
//! 4. records a monitoring link in the caller's history
//!
//! Files are processed one after another. The first storage or pipeline
//! failure ends the batch; files handled before it keep their records.

mod error;
mod naming;
mod orchestrator;
mod types;

pub use error::TriggerError;
pub use naming::{
    console_link, customer_name, job_display_name, pipeline_job_id,
    training_budget_milli_node_hours,
};
pub use orchestrator::TriggerOrchestrator;
pub use types::{
    TriggerOptions, TriggerOutcome, TriggerSettings, Upload, MAX_TRAINING_BUDGET_HOURS,
    MIN_TRAINING_BUDGET_HOURS,
};
