use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Only values the crawler cannot run with are rejected. Questionable but
/// workable values (an aggressive request rate, a start URL on another host)
/// are accepted and reported through the log when the crawl starts.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    parse_http_url("start_url", &config.start_url)?;
    parse_http_url("site_base", &config.site_base)?;

    if !config.content_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "content_prefix must start with '/', got '{}'",
            config.content_prefix
        )));
    }

    let non_zero = [
        ("requests_per_second", config.requests_per_second as u64),
        ("time_period_ms", config.time_period_ms),
        ("batch_size", config.batch_size as u64),
        ("frontier_capacity", config.frontier_capacity as u64),
    ];
    for (name, value) in non_zero {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than zero",
                name
            )));
        }
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, '-' and '_', got '{}'",
            config.crawler_name
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parses a URL and requires an http or https scheme
fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(url)
}
