use crate::config::types::{Config, FetcherConfig, LinkCheckConfig, RenderConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Politeness floor between consecutive fetches
pub const MIN_PACING_MS: u64 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_link_check_config(&config.links)?;
    validate_render_config(&config.render)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fetcher.user-agent cannot be empty".to_string(),
        ));
    }

    if !config.referer.is_empty() {
        Url::parse(&config.referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid fetcher.referer: {}", e)))?;
    }

    validate_timeout("fetcher.timeout-secs", config.timeout_secs)?;

    if config.pacing_ms < MIN_PACING_MS {
        return Err(ConfigError::Validation(format!(
            "fetcher.pacing-ms must be >= {}ms, got {}ms",
            MIN_PACING_MS, config.pacing_ms
        )));
    }

    Ok(())
}

/// Validates link check configuration
fn validate_link_check_config(config: &LinkCheckConfig) -> Result<(), ConfigError> {
    validate_timeout("links.timeout-secs", config.timeout_secs)?;

    if config.max_concurrency < 1 || config.max_concurrency > 1000 {
        return Err(ConfigError::Validation(format!(
            "links.max-concurrency must be between 1 and 1000, got {}",
            config.max_concurrency
        )));
    }

    Ok(())
}

/// Validates render configuration
///
/// The WebDriver URL is only checked when rendering is switched on.
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    validate_timeout("render.timeout-secs", config.timeout_secs)?;

    if config.idle_ms == 0 || config.idle_ms > config.timeout_secs * 1000 {
        return Err(ConfigError::Validation(format!(
            "render.idle-ms must be between 1 and the render timeout, got {}ms",
            config.idle_ms
        )));
    }

    if config.enabled {
        let url = Url::parse(&config.webdriver_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid render.webdriver-url: {}", e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "render.webdriver-url must use http or https, got '{}'",
                config.webdriver_url
            )));
        }
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "storage.database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_timeout(key: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < 1 || secs > 300 {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and 300 seconds, got {}",
            key, secs
        )));
    }
    Ok(())
}
