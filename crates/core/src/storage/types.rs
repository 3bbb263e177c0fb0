//! Staged object types and helpers.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ObjectStore, StorageError};

/// Folder in the bucket every upload lands in.
pub const UPLOAD_PREFIX: &str = "uploads";

/// An upload persisted in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedObject {
    pub bucket: String,
    pub object_path: String,
    pub size_bytes: u64,
}

impl StagedObject {
    /// `gs://` address handed to the pipeline.
    pub fn uri(&self) -> String {
        gcs_uri(&self.bucket, &self.object_path)
    }
}

/// Object path for an uploaded file: `uploads/{filename}`.
pub fn staged_object_path(filename: &str) -> String {
    format!("{}/{}", UPLOAD_PREFIX, filename)
}

pub fn gcs_uri(bucket: &str, object_path: &str) -> String {
    format!("gs://{}/{}", bucket, object_path)
}

/// Stage uploaded bytes in the store.
///
/// The bytes go through a local temporary file which is removed as soon as
/// the upload call returns, whether it succeeded or not.
pub async fn stage_upload(
    store: &dyn ObjectStore,
    filename: &str,
    content: &[u8],
) -> Result<StagedObject, StorageError> {
    let object_path = staged_object_path(filename);

    let mut temp = tempfile::Builder::new()
        .prefix("napex-")
        .suffix(".csv")
        .tempfile()
        .map_err(StorageError::TempFile)?;
    temp.write_all(content).map_err(StorageError::TempFile)?;
    temp.flush().map_err(StorageError::TempFile)?;

    debug!(
        "Staging {} ({} bytes) via {:?}",
        object_path,
        content.len(),
        temp.path()
    );

    let result = store.upload_file(&object_path, temp.path()).await;

    if let Err(e) = temp.close() {
        warn!("Failed to remove temporary copy of {}: {}", filename, e);
    }

    result
}
