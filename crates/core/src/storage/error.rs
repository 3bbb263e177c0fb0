//! Error types for the storage module.

use thiserror::Error;

/// Errors that can occur while staging a file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing or reading the local temporary copy failed.
    #[error("Temporary file error: {0}")]
    TempFile(#[source] std::io::Error),

    /// Could not build the HTTP client.
    #[error("Client initialization failed: {0}")]
    ClientInit(String),

    /// Could not reach the storage service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The storage service did not answer in time.
    #[error("Request timeout")]
    Timeout,

    /// The storage service rejected the upload.
    #[error("Storage API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StorageError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StorageError::Timeout
        } else if e.is_connect() {
            StorageError::ConnectionFailed(e.to_string())
        } else {
            StorageError::InvalidResponse(e.to_string())
        }
    }
}
