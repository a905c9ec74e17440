use crate::config::types::{
    Config, IdentityConfig, OutputConfig, ProxyConfig, ProxyDescriptor, SchedulerConfig,
    ScraperConfig,
};
use crate::ConfigError;
use reqwest::header::HeaderValue;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_proxy_config(&config.proxy)?;
    validate_identity_config(&config.identity)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates target site and retry settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    let origin = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.scheme() != "http" && origin.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Origin '{}' must use http or https",
            config.origin
        )));
    }

    if origin.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "Origin '{}' cannot be used as a base URL",
            config.origin
        )));
    }

    if config.total_pages < 1 {
        return Err(ConfigError::Validation(
            "total_pages must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates scheduler limits
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_tasks < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_tasks must be >= 1, got {}",
            config.max_concurrent_tasks
        )));
    }

    if config.requests_per_window < 1 {
        return Err(ConfigError::Validation(format!(
            "requests_per_window must be >= 1, got {}",
            config.requests_per_window
        )));
    }

    if config.window_ms < 1 {
        return Err(ConfigError::Validation(
            "window_ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy descriptors
///
/// An empty list with `use-proxy` enabled is allowed: requests go out directly.
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    for proxy in &config.servers {
        validate_proxy_descriptor(proxy)?;
    }

    if config.use_proxy && config.servers.is_empty() {
        tracing::warn!("use-proxy is enabled but no proxy servers are configured");
    }

    Ok(())
}

fn validate_proxy_descriptor(proxy: &ProxyDescriptor) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidProxy {
        proxy: format!("{}:{}", proxy.host, proxy.port),
        message: message.to_string(),
    };

    if proxy.host.trim().is_empty() {
        return Err(invalid("host cannot be empty"));
    }

    if proxy
        .host
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '@')
    {
        return Err(invalid("host contains invalid characters"));
    }

    if proxy.port == 0 {
        return Err(invalid("port must be non-zero"));
    }

    if proxy.password.is_some() && proxy.username.is_none() {
        return Err(invalid("password given without username"));
    }

    reqwest::Proxy::all(proxy.url()).map_err(|e| invalid(&e.to_string()))?;

    Ok(())
}

/// Validates custom user agents as header values
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    for agent in &config.user_agents {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user agent cannot be empty".to_string(),
            ));
        }

        HeaderValue::from_str(agent).map_err(|_| {
            ConfigError::Validation(format!("user agent '{}' is not a valid header value", agent))
        })?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json_path cannot be empty".to_string(),
        ));
    }

    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
