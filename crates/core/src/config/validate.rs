use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upstream URL is an http(s) URL and the API key is set
/// - Timeout, retry budget and connection ceiling are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let url = config.upstream.url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "upstream.url must be set".to_string(),
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "upstream.url must start with http:// or https:// (got '{}')",
            url
        )));
    }

    if config.upstream.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "upstream.api_key must be set".to_string(),
        ));
    }

    if config.upstream.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.upstream.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.max_retries must be at least 1".to_string(),
        ));
    }

    if config.upstream.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "upstream.max_connections cannot be 0".to_string(),
        ));
    }

    Ok(())
}
