//! Google Cloud Storage implementation using the JSON API media upload.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::metrics::{BYTES_STAGED, EXTERNAL_SERVICE_DURATION, EXTERNAL_SERVICE_REQUESTS};

use super::{ObjectStore, StagedObject, StorageError};

/// Object store backed by a GCS bucket.
pub struct GcsObjectStore {
    client: Client,
    api_url: String,
    bucket: String,
    access_token: Option<String>,
}

/// Object resource returned by the upload endpoint.
#[derive(Debug, Deserialize)]
struct GcsObject {
    name: String,
    bucket: String,
    /// The JSON API encodes sizes as decimal strings.
    #[serde(default)]
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GcsErrorBody {
    error: GcsErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GcsErrorDetail {
    message: String,
}

impl GcsObjectStore {
    /// Create a store writing into `bucket`.
    pub fn new(
        config: &StorageConfig,
        bucket: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| StorageError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            access_token,
        })
    }

    fn upload_url(&self, object_path: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.api_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(object_path)
        )
    }

    async fn send_upload(
        &self,
        object_path: &str,
        data: Vec<u8>,
    ) -> Result<StagedObject, StorageError> {
        let local_size = data.len() as u64;
        let url = self.upload_url(object_path);

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type(object_path))
            .body(data);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(StorageError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GcsErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(StorageError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let object: GcsObject = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        let size_bytes = object
            .size
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(local_size);

        Ok(StagedObject {
            bucket: object.bucket,
            object_path: object.name,
            size_bytes,
        })
    }
}

/// Media type for an object, from its extension.
fn content_type(object_path: &str) -> &'static str {
    let ext = object_path
        .rsplit_once('/')
        .map_or(object_path, |(_, name)| name)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => "text/csv",
        Some("tsv") => "text/tab-separated-values",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    fn name(&self) -> &str {
        "gcs"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        object_path: &str,
        local_path: &Path,
    ) -> Result<StagedObject, StorageError> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(StorageError::TempFile)?;

        debug!(
            "Uploading {} bytes to gs://{}/{}",
            data.len(),
            self.bucket,
            object_path
        );

        let start = Instant::now();
        let result = self.send_upload(object_path, data).await;
        EXTERNAL_SERVICE_DURATION
            .with_label_values(&["gcs", "upload"])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(staged) => {
                EXTERNAL_SERVICE_REQUESTS
                    .with_label_values(&["gcs", "upload", "success"])
                    .inc();
                BYTES_STAGED.inc_by(staged.size_bytes);
                info!("Uploaded {}", staged.uri());
            }
            Err(_) => {
                EXTERNAL_SERVICE_REQUESTS
                    .with_label_values(&["gcs", "upload", "error"])
                    .inc();
            }
        }

        result
    }
}
