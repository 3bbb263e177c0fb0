//! Trait definitions for the storage module.

use std::path::Path;

use async_trait::async_trait;

use super::error::StorageError;
use super::types::StagedObject;

/// A durable blob store the pipeline can read from.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Bucket every object is written to.
    fn bucket(&self) -> &str;

    /// Uploads the file at `local_path` to `object_path` in the bucket.
    async fn upload_file(
        &self,
        object_path: &str,
        local_path: &Path,
    ) -> Result<StagedObject, StorageError>;
}
