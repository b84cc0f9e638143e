//! SEO Wayfinder: a sitemap-driven SEO crawler
//!
//! This crate walks a site's sitemap hierarchy, fetches every page it finds, and
//! extracts the facts an SEO audit cares about (titles, headings, links, images,
//! metadata) while checking the health of every link it encounters.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for SEO Wayfinder operations
#[derive(Debug, Error)]
pub enum WayfinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("XML parse error for {url}: {message}")]
    XmlParse { url: String, message: String },

    #[error("Render error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for SEO Wayfinder operations
pub type Result<T> = std::result::Result<T, WayfinderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    Coordinator, CrawlResult, Image, LinkStatus, LinkStatusCache, PageRecord, SkippedUrl,
};
pub use url::{CrawlInput, UrlParts};
