//! Mock object store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ObjectStore, StagedObject, StorageError};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub object_path: String,
    pub content: Vec<u8>,
    /// Whether the local file still existed when the upload was made.
    pub local_file_existed: bool,
}

/// Mock implementation of the ObjectStore trait.
///
/// Keeps uploaded objects in memory and can be told to fail for a given
/// object path.
#[derive(Debug)]
pub struct MockObjectStore {
    bucket: String,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// Objects that fail once with the given error.
    failures: Arc<RwLock<HashMap<String, StorageError>>>,
}

impl MockObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            uploads: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Get the number of uploads performed.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Content of a stored object, if uploaded.
    pub async fn object(&self, object_path: &str) -> Option<Vec<u8>> {
        self.uploads
            .read()
            .await
            .iter()
            .rev()
            .find(|u| u.object_path == object_path)
            .map(|u| u.content.clone())
    }

    /// Make the next upload to `object_path` fail with `error`.
    pub async fn fail_object(&self, object_path: impl Into<String>, error: StorageError) {
        self.failures.write().await.insert(object_path.into(), error);
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        object_path: &str,
        local_path: &Path,
    ) -> Result<StagedObject, StorageError> {
        if let Some(err) = self.failures.write().await.remove(object_path) {
            return Err(err);
        }

        let local_file_existed = local_path.exists();
        let content = tokio::fs::read(local_path)
            .await
            .map_err(StorageError::TempFile)?;
        let size_bytes = content.len() as u64;

        self.uploads.write().await.push(RecordedUpload {
            object_path: object_path.to_string(),
            content,
            local_file_existed,
        });

        Ok(StagedObject {
            bucket: self.bucket.clone(),
            object_path: object_path.to_string(),
            size_bytes,
        })
    }
}
