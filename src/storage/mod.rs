//! Storage module for persisting crawl results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Saving extracted pages under named projects
//! - Listing, fetching, and deleting projects

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::PageRecord;
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A project in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub page_count: usize,
}

/// A page record as saved in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPage {
    pub url: String,
    pub saved_at: String,
    pub record: PageRecord,
}
