//! Crawl summary statistics
//!
//! Aggregates a finished [`CrawlResult`] into the headline numbers of an SEO
//! audit and prints them.

use crate::crawler::CrawlResult;
use serde::Serialize;
use std::collections::BTreeSet;

/// Headline numbers for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Pages extracted
    pub pages: usize,

    /// URLs given up on
    pub skipped: usize,

    pub total_links: usize,
    pub internal_links: usize,
    pub external_links: usize,

    /// Distinct failing link targets across all pages
    pub non_200_links: usize,

    /// Images without alt text, summed over pages
    pub missing_alt_images: usize,

    pub noindex_pages: usize,
    pub pages_without_title: usize,
    pub pages_without_description: usize,
}

impl CrawlSummary {
    /// Computes the summary of a crawl result
    pub fn from_result(result: &CrawlResult) -> Self {
        let mut summary = Self {
            pages: result.len(),
            skipped: result.skipped.len(),
            ..Self::default()
        };
        let mut failing = BTreeSet::new();

        for record in result.pages.values() {
            summary.total_links += record.links.len();
            summary.internal_links += record.internal_links.len();
            summary.external_links += record.external_links.len();
            summary.missing_alt_images += record.missing_alt_images.len();
            failing.extend(record.non_200_links.iter().map(String::as_str));

            if record.noindex {
                summary.noindex_pages += 1;
            }
            if record.title.is_empty() {
                summary.pages_without_title += 1;
            }
            if record.meta_description.is_empty() {
                summary.pages_without_description += 1;
            }
        }

        summary.non_200_links = failing.len();
        summary
    }
}

/// Prints a summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
/// * `result` - The crawl result it was computed from, for listing skipped URLs
pub fn print_summary(summary: &CrawlSummary, result: &CrawlResult) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Pages extracted: {}", summary.pages);
    println!("  URLs skipped: {}", summary.skipped);
    println!();

    println!("Links:");
    println!("  Total: {}", summary.total_links);
    println!("  Internal: {}", summary.internal_links);
    println!("  External: {}", summary.external_links);
    println!("  Distinct non-200: {}", summary.non_200_links);
    println!();

    println!("On-page issues:");
    println!("  Images missing alt text: {}", summary.missing_alt_images);
    println!("  Noindex pages: {}", summary.noindex_pages);
    println!("  Pages without title: {}", summary.pages_without_title);
    println!(
        "  Pages without meta description: {}",
        summary.pages_without_description
    );

    if !result.skipped.is_empty() {
        println!();
        println!("Skipped URLs ({}):", result.skipped.len());
        for skipped in &result.skipped {
            println!("  - {} ({})", skipped.url, skipped.reason);
        }
    }
}
