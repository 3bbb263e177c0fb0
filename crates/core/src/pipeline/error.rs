//! Error types for pipeline submission.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Pipeline API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The pipeline template could not be read or is not a pipeline spec.
    #[error("Invalid pipeline template: {0}")]
    InvalidTemplate(String),
}

impl PipelineError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PipelineError::Timeout
        } else if e.is_connect() {
            PipelineError::ConnectionFailed(e.to_string())
        } else {
            PipelineError::InvalidResponse(e.to_string())
        }
    }
}
