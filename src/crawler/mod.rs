//! Crawler module for sitemap expansion and page extraction
//!
//! This module contains the core crawl pipeline, including:
//! - Plain HTTP fetching with pacing, and headless rendering
//! - XML vs HTML classification of fetched content
//! - Cycle-safe sitemap resolution
//! - Memoized, bounded-concurrency link checking
//! - Page extraction into structured SEO records
//! - Overall crawl coordination

mod classifier;
mod coordinator;
mod extractor;
mod fetcher;
mod links;
mod render;
mod sitemap;

pub use classifier::is_xml;
pub use coordinator::{Coordinator, CrawlResult, SkippedUrl};
pub use extractor::{extract_page, parse_page, Image, PageRecord, HEADING_LEVELS};
pub use fetcher::{build_http_client, Fetcher, Pacer};
pub use links::{LinkStatus, LinkStatusCache, LinkValidator};
pub use render::{Renderer, WebDriverRenderer};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapResolver};

use crate::config::Config;
use crate::WayfinderError;

/// Runs a complete crawl of one input
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP clients (and the renderer, if enabled)
/// 2. Resolve the input into page URLs
/// 3. Fetch, extract, and link-check every page
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `input` - A sitemap URL, page URL, or local sitemap path
///
/// # Returns
///
/// * `Ok(CrawlResult)` - Extracted pages and skipped URLs
/// * `Err(WayfinderError)` - The input was invalid or unreadable
///
/// # Example
///
/// ```no_run
/// use seo_wayfinder::config::Config;
/// use seo_wayfinder::crawler::crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let result = crawl(Config::default(), "https://example.com/sitemap.xml").await?;
/// println!("{} pages", result.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, input: &str) -> Result<CrawlResult, WayfinderError> {
    Coordinator::new(config)?.run(input).await
}
