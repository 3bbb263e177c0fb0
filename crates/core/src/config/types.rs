use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub gcp: GcpConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body in bytes (all uploaded files together).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Idle time after which a session and its history are dropped.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

fn default_session_ttl_secs() -> u64 {
    8 * 60 * 60
}

/// Cloud project settings shared by the storage and pipeline clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GcpConfig {
    pub project_id: String,
    pub region: String,
    pub bucket_name: String,
    /// Compiled pipeline template (local path, `gs://` or registry URI).
    pub pipeline_template_path: String,
    /// Service account the pipeline job runs as.
    #[serde(default)]
    pub service_account: Option<String>,
    /// Pre-issued OAuth bearer token sent to both cloud APIs.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Object storage client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_storage_api_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_storage_api_url() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_timeout() -> u32 {
    60
}

/// Pipeline service client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Override for the regional endpoint (`https://{region}-aiplatform.googleapis.com`).
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl PipelineConfig {
    /// Endpoint to submit jobs to for the given region.
    pub fn endpoint(&self, region: &str) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", region),
        }
    }
}

/// What to do when a customer name was already triggered in the session.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Leave the earlier run alone and report the file as skipped.
    #[default]
    Skip,
    /// Submit another independent run.
    Resubmit,
}

/// Orchestration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    #[serde(default = "default_job_name_prefix")]
    pub job_name_prefix: String,
    /// Append `-YYYYMMDD` to job display names.
    #[serde(default)]
    pub date_stamp: bool,
    #[serde(default)]
    pub enable_caching: bool,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Reject uploads that are not `.csv` files.
    #[serde(default = "default_true")]
    pub csv_only: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            job_name_prefix: default_job_name_prefix(),
            date_stamp: false,
            enable_caching: false,
            duplicate_policy: DuplicatePolicy::default(),
            csv_only: true,
        }
    }
}

fn default_job_name_prefix() -> String {
    "pipeline-automl-cashflow".to_string()
}

fn default_true() -> bool {
    true
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub gcp: SanitizedGcpConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub trigger: TriggerConfig,
}

/// GCP config with the access token hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGcpConfig {
    pub project_id: String,
    pub region: String,
    pub bucket_name: String,
    pub pipeline_template_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    pub access_token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            gcp: SanitizedGcpConfig {
                project_id: config.gcp.project_id.clone(),
                region: config.gcp.region.clone(),
                bucket_name: config.gcp.bucket_name.clone(),
                pipeline_template_path: config.gcp.pipeline_template_path.clone(),
                service_account: config.gcp.service_account.clone(),
                access_token_configured: config
                    .gcp
                    .access_token
                    .as_ref()
                    .is_some_and(|t| !t.is_empty()),
            },
            storage: config.storage.clone(),
            pipeline: config.pipeline.clone(),
            trigger: config.trigger.clone(),
        }
    }
}
