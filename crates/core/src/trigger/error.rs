//! Error types for trigger orchestration.

use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum TriggerError {
    /// No files were submitted.
    #[error("No files uploaded")]
    NoFiles,

    /// A user option is out of range.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// An uploaded file was rejected before any cloud call.
    #[error("Invalid upload {filename:?}: {reason}")]
    InvalidUpload { filename: String, reason: String },

    /// Staging the file in object storage failed.
    #[error("Failed to stage {filename}: {source}")]
    Storage {
        filename: String,
        #[source]
        source: StorageError,
    },

    /// Submitting the pipeline job failed.
    #[error("Failed to submit pipeline for {customer_name}: {source}")]
    Pipeline {
        customer_name: String,
        #[source]
        source: PipelineError,
    },
}

impl TriggerError {
    /// Whether the request itself was at fault, as opposed to a cloud service.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::NoFiles | Self::InvalidOptions(_) | Self::InvalidUpload { .. }
        )
    }
}
