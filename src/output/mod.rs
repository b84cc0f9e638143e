//! Output module for crawl results
//!
//! This module handles:
//! - Exporting the page mapping of a crawl as JSON
//! - Summarizing a crawl for the terminal

mod summary;

pub use summary::{print_summary, CrawlSummary};

use crate::crawler::CrawlResult;
use crate::WayfinderError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes the page mapping of a crawl result as pretty JSON
pub fn to_json(result: &CrawlResult) -> Result<String, WayfinderError> {
    Ok(serde_json::to_string_pretty(&result.pages)?)
}

/// Writes the page mapping of a crawl result to a JSON file
///
/// # Arguments
///
/// * `result` - The crawl result to export
/// * `path` - Destination file, created or truncated
///
/// # Returns
///
/// * `Ok(())` - File written
/// * `Err(WayfinderError)` - Failed to create or write the file
pub fn write_json(result: &CrawlResult, path: &Path) -> Result<(), WayfinderError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &result.pages)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Wrote {} pages to {}", result.len(), path.display());
    Ok(())
}
