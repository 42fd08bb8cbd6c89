use crate::config::types::ClientConfig;
use crate::ConfigError;
use url::Url;

/// Upper bound on token refreshes for a single request
const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
    validate_endpoint("api_base_url", &config.api_base_url)?;
    validate_endpoint("token_endpoint", &config.token_endpoint)?;
    validate_limits(config)?;
    validate_headers(config)?;
    Ok(())
}

/// Validates that an endpoint is an absolute http(s) URL
fn validate_endpoint(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}

/// Validates numeric limits
fn validate_limits(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.retry_attempts > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be <= {}, got {}",
            MAX_RETRY_ATTEMPTS, config.retry_attempts
        )));
    }

    if config.scan_page_size < 1 {
        return Err(ConfigError::Validation(
            "scan_page_size must be >= 1".to_string(),
        ));
    }

    if config.max_concurrent_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_concurrent_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got request={}s connect={}s",
            config.request_timeout_secs, config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates default protocol headers
fn validate_headers(config: &ClientConfig) -> Result<(), ConfigError> {
    for name in config.headers.keys() {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "header names cannot be empty".to_string(),
            ));
        }

        if name.eq_ignore_ascii_case("authorization") {
            return Err(ConfigError::Validation(
                "the Authorization header is managed by the client".to_string(),
            ));
        }
    }

    Ok(())
}
