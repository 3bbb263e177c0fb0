//! Compiled pipeline templates.
//!
//! The create call carries the pipeline spec itself so that per-task caching
//! can be switched off. The job resource has no caching field; caching lives
//! in `cachingOptions.enableCache` on every task of every DAG in the spec.

use std::path::PathBuf;

use serde_json::{json, Value};

use super::PipelineError;

/// Where a template is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// HTTP(S) URL; `gs://` URIs are mapped to the storage media download URL.
    Remote(String),
    /// Path on the local filesystem.
    Local(PathBuf),
}

impl TemplateSource {
    pub fn resolve(template_uri: &str, storage_api_url: &str) -> Result<Self, PipelineError> {
        if let Some(rest) = template_uri.strip_prefix("gs://") {
            let (bucket, object) = rest
                .split_once('/')
                .filter(|(bucket, object)| !bucket.is_empty() && !object.is_empty())
                .ok_or_else(|| {
                    PipelineError::InvalidTemplate(format!(
                        "{} is not a gs://bucket/object URI",
                        template_uri
                    ))
                })?;
            return Ok(Self::Remote(format!(
                "{}/storage/v1/b/{}/o/{}?alt=media",
                storage_api_url.trim_end_matches('/'),
                urlencoding::encode(bucket),
                urlencoding::encode(object)
            )));
        }

        if template_uri.starts_with("https://") || template_uri.starts_with("http://") {
            return Ok(Self::Remote(template_uri.to_string()));
        }

        Ok(Self::Local(PathBuf::from(template_uri)))
    }
}

/// Parse a compiled template into a pipeline spec.
///
/// Accepts either a bare spec or a job document wrapping it under
/// `pipelineSpec`. Only JSON templates are supported.
pub fn pipeline_spec_from_template(bytes: &[u8]) -> Result<Value, PipelineError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::InvalidTemplate(format!("not valid JSON: {}", e)))?;

    let spec = match document {
        Value::Object(mut map) if map.contains_key("pipelineSpec") => {
            map.remove("pipelineSpec").unwrap_or(Value::Null)
        }
        other => other,
    };

    if spec.get("root").is_none() {
        return Err(PipelineError::InvalidTemplate(
            "pipeline spec has no root component".to_string(),
        ));
    }
    Ok(spec)
}

/// Set `cachingOptions.enableCache` on every task of the root DAG and of
/// every component DAG.
pub fn set_enable_caching(spec: &mut Value, enable_caching: bool) {
    if let Some(root) = spec.get_mut("root") {
        set_dag_caching(root, enable_caching);
    }
    if let Some(Value::Object(components)) = spec.get_mut("components") {
        for component in components.values_mut() {
            set_dag_caching(component, enable_caching);
        }
    }
}

fn set_dag_caching(component: &mut Value, enable_caching: bool) {
    let tasks = component
        .get_mut("dag")
        .and_then(|dag| dag.get_mut("tasks"))
        .and_then(Value::as_object_mut);
    if let Some(tasks) = tasks {
        for task in tasks.values_mut() {
            if let Value::Object(task) = task {
                task.insert(
                    "cachingOptions".to_string(),
                    json!({ "enableCache": enable_caching }),
                );
            }
        }
    }
}
