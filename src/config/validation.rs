use crate::config::types::{Config, ListingConfig, PathsConfig, RetryConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_paths_config(&config.paths)?;
    validate_retry_config(&config.retry)?;
    validate_listing_config(&config.listing)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search-path must start with '/', got '{}'",
            config.search_path
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_seconds < 1 || config.timeout_seconds > 600 {
        return Err(ConfigError::Validation(format!(
            "timeout-seconds must be between 1 and 600, got {}",
            config.timeout_seconds
        )));
    }

    Ok(())
}

fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("categories-file", &config.categories_file),
        ("listing-dir", &config.listing_dir),
        ("details-dir", &config.details_dir),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.listing_dir == config.details_dir {
        return Err(ConfigError::Validation(
            "listing-dir and details-dir must differ".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_retries > 20 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 20, got {}",
            config.max_retries
        )));
    }

    if config.base_delay_ms > 600_000 {
        return Err(ConfigError::Validation(format!(
            "base-delay-ms must be <= 600000, got {}",
            config.base_delay_ms
        )));
    }

    Ok(())
}

fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(
            "max-consecutive-failures must be >= 1".to_string(),
        ));
    }

    Ok(())
}
