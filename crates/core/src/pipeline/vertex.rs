//! Vertex AI Pipelines implementation over the REST API.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{GcpConfig, PipelineConfig, StorageConfig};
use crate::metrics::{EXTERNAL_SERVICE_DURATION, EXTERNAL_SERVICE_REQUESTS};

use super::template::{pipeline_spec_from_template, set_enable_caching, TemplateSource};
use super::{JobHandle, JobRequest, PipelineError, PipelineService};

/// Submits `pipelineJobs.create` requests to a regional Vertex AI endpoint.
///
/// The compiled template is fetched for every submission and sent inline as
/// `pipelineSpec`, with each task's caching switch set from the request.
pub struct VertexPipelineClient {
    client: Client,
    endpoint: String,
    storage_api_url: String,
    project: String,
    region: String,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePipelineJobBody<'a> {
    display_name: &'a str,
    pipeline_spec: &'a serde_json::Value,
    runtime_config: RuntimeConfig<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_account: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig<'a> {
    parameter_values: &'a BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineJobResource {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl VertexPipelineClient {
    /// `storage` locates `gs://` templates.
    pub fn new(
        config: &PipelineConfig,
        storage: &StorageConfig,
        gcp: &GcpConfig,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PipelineError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(&gcp.region),
            storage_api_url: storage.api_url.trim_end_matches('/').to_string(),
            project: gcp.project_id.clone(),
            region: gcp.region.clone(),
            access_token: gcp.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Fetch the compiled template and return its pipeline spec.
    async fn load_pipeline_spec(
        &self,
        template_uri: &str,
    ) -> Result<serde_json::Value, PipelineError> {
        let bytes = match TemplateSource::resolve(template_uri, &self.storage_api_url)? {
            TemplateSource::Local(path) => tokio::fs::read(&path).await.map_err(|e| {
                PipelineError::InvalidTemplate(format!("cannot read {:?}: {}", path, e))
            })?,
            TemplateSource::Remote(url) => {
                let start = Instant::now();
                let result = self.download(&url).await;
                EXTERNAL_SERVICE_DURATION
                    .with_label_values(&["vertex_ai", "load_template"])
                    .observe(start.elapsed().as_secs_f64());
                let status = if result.is_ok() { "success" } else { "error" };
                EXTERNAL_SERVICE_REQUESTS
                    .with_label_values(&["vertex_ai", "load_template", status])
                    .inc();
                result?
            }
        };

        debug!("Loaded pipeline template {} ({} bytes)", template_uri, bytes.len());
        pipeline_spec_from_template(&bytes)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let mut http = self.client.get(url);
        if let Some(token) = &self.access_token {
            http = http.bearer_auth(token);
        }

        let response = http.send().await.map_err(PipelineError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::ApiError {
                status: status.as_u16(),
                message: format!(
                    "template download failed: {}",
                    api_error_message(&text)
                ),
            });
        }

        let bytes = response.bytes().await.map_err(PipelineError::from_reqwest)?;
        Ok(bytes.to_vec())
    }

    fn create_url(&self, job_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/pipelineJobs?pipelineJobId={}",
            self.endpoint,
            urlencoding::encode(&self.project),
            urlencoding::encode(&self.region),
            urlencoding::encode(job_id)
        )
    }

    async fn create(
        &self,
        request: &JobRequest,
        pipeline_spec: &serde_json::Value,
    ) -> Result<JobHandle, PipelineError> {
        let body = create_body(request, pipeline_spec);

        let mut http = self.client.post(self.create_url(&request.job_id)).json(&body);
        if let Some(token) = &self.access_token {
            http = http.bearer_auth(token);
        }

        let response = http.send().await.map_err(PipelineError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::ApiError {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let resource: PipelineJobResource = response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))?;

        debug!(
            "Pipeline job {} created in state {:?}",
            resource.name, resource.state
        );

        let job_id = resource
            .name
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(request.job_id.as_str())
            .to_string();

        Ok(JobHandle {
            job_id,
            display_name: resource
                .display_name
                .unwrap_or_else(|| request.display_name.clone()),
            resource_name: resource.name,
        })
    }
}

fn create_body<'a>(
    request: &'a JobRequest,
    pipeline_spec: &'a serde_json::Value,
) -> CreatePipelineJobBody<'a> {
    CreatePipelineJobBody {
        display_name: &request.display_name,
        pipeline_spec,
        runtime_config: RuntimeConfig {
            parameter_values: &request.parameter_values,
        },
        service_account: request.service_account.as_deref(),
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

#[async_trait]
impl PipelineService for VertexPipelineClient {
    fn name(&self) -> &str {
        "vertex_ai"
    }

    async fn submit(&self, request: JobRequest) -> Result<JobHandle, PipelineError> {
        let mut pipeline_spec = self.load_pipeline_spec(&request.template_uri).await?;
        set_enable_caching(&mut pipeline_spec, request.enable_caching);

        let start = Instant::now();
        let result = self.create(&request, &pipeline_spec).await;
        EXTERNAL_SERVICE_DURATION
            .with_label_values(&["vertex_ai", "create_pipeline_job"])
            .observe(start.elapsed().as_secs_f64());

        let status = if result.is_ok() { "success" } else { "error" };
        EXTERNAL_SERVICE_REQUESTS
            .with_label_values(&["vertex_ai", "create_pipeline_job", status])
            .inc();

        if let Ok(handle) = &result {
            info!(
                "Submitted pipeline job {} ({})",
                handle.job_id, handle.display_name
            );
        }

        result
    }
}
