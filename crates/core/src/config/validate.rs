use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Session TTL is not 0
/// - Project, region, bucket and template are set
/// - Service URLs are http(s)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.session_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "server.session_ttl_secs cannot be 0".to_string(),
        ));
    }

    let required = [
        ("gcp.project_id", &config.gcp.project_id),
        ("gcp.region", &config.gcp.region),
        ("gcp.bucket_name", &config.gcp.bucket_name),
        ("gcp.pipeline_template_path", &config.gcp.pipeline_template_path),
        ("trigger.job_name_prefix", &config.trigger.job_name_prefix),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                key
            )));
        }
    }

    if config.gcp.bucket_name.contains('/') {
        return Err(ConfigError::ValidationError(
            "gcp.bucket_name must be a bare bucket name".to_string(),
        ));
    }

    check_url("storage.api_url", &config.storage.api_url)?;
    if let Some(url) = &config.pipeline.api_url {
        check_url("pipeline.api_url", url)?;
    }

    Ok(())
}

fn check_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got {:?}",
            key, url
        )))
    }
}
