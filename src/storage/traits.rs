//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::{CrawlResult, PageRecord};
use crate::storage::{ProjectRecord, StoredPage};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Pages are grouped into named projects. A project is created the first time a
/// page is saved under its name.
pub trait Storage {
    /// Saves one page record under `project`
    ///
    /// Saving a URL that the project already holds replaces the earlier record.
    ///
    /// # Arguments
    ///
    /// * `project` - Project name
    /// * `url` - The page URL the record belongs to
    /// * `record` - The extracted page
    fn save_page(&mut self, project: &str, url: &str, record: &PageRecord) -> StorageResult<()>;

    /// Saves every page of a crawl result; returns the number saved
    fn save_result(&mut self, project: &str, result: &CrawlResult) -> StorageResult<usize> {
        for (url, record) in &result.pages {
            self.save_page(project, url, record)?;
        }
        Ok(result.pages.len())
    }

    /// Lists all projects, ordered by name
    fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>>;

    /// Returns the pages saved under `project`, ordered by URL
    ///
    /// # Errors
    ///
    /// `ProjectNotFound` if no project has that name.
    fn fetch_pages(&self, project: &str) -> StorageResult<Vec<StoredPage>>;

    /// Deletes a project and its pages; returns false if it did not exist
    fn delete_project(&mut self, name: &str) -> StorageResult<bool>;

    /// Deletes every project and page
    fn clear_all(&mut self) -> StorageResult<()>;
}
