//! URL handling module for SEO Wayfinder
//!
//! This module provides crawl input classification, href resolution, host
//! comparison, and slug/URL-part splitting.

mod domain;
mod input;
mod parts;
mod resolve;

// Re-export main functions
pub use domain::{extract_domain, is_same_host};
pub use input::CrawlInput;
pub use parts::{split_url, UrlParts};
pub use resolve::{is_http_link, resolve_href};
