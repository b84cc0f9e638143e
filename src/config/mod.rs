//! Configuration module for SEO Wayfinder
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: every key has a default.
//!
//! # Example
//!
//! ```no_run
//! use seo_wayfinder::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wayfinder.toml")).unwrap();
//! println!("Link checks run {} at a time", config.links.max_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, LinkCheckConfig, RenderConfig, StorageConfig, DEFAULT_REFERER,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
