//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Page records are stored as JSON documents, one row per project and URL.

use crate::crawler::PageRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ProjectRecord, StoredPage};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;
        tracing::debug!("Opened database {}", path.display());

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn project_id(&self, name: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl Storage for SqliteStorage {
    fn save_page(&mut self, project: &str, url: &str, record: &PageRecord) -> StorageResult<()> {
        let json = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO projects (name, created_at) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING",
            params![project, now],
        )?;
        let project_id: i64 = tx.query_row(
            "SELECT id FROM projects WHERE name = ?1",
            params![project],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO pages (project_id, url, saved_at, record) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(project_id, url) DO UPDATE SET
                saved_at = excluded.saved_at,
                record = excluded.record",
            params![project_id, url, now, json],
        )?;
        tx.commit()?;

        tracing::trace!("Saved {} under project '{}'", url, project);
        Ok(())
    }

    fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.created_at, COUNT(pg.id)
             FROM projects p LEFT JOIN pages pg ON pg.project_id = p.id
             GROUP BY p.id
             ORDER BY p.name",
        )?;

        let projects = stmt
            .query_map([], |row| {
                Ok(ProjectRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                    page_count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    fn fetch_pages(&self, project: &str) -> StorageResult<Vec<StoredPage>> {
        let project_id = self
            .project_id(project)?
            .ok_or_else(|| StorageError::ProjectNotFound(project.to_string()))?;

        let mut stmt = self.conn.prepare(
            "SELECT url, saved_at, record FROM pages WHERE project_id = ?1 ORDER BY url",
        )?;

        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut pages = Vec::with_capacity(rows.len());
        for (url, saved_at, json) in rows {
            pages.push(StoredPage {
                url,
                saved_at,
                record: serde_json::from_str(&json)?,
            });
        }

        Ok(pages)
    }

    fn delete_project(&mut self, name: &str) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM projects WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    fn clear_all(&mut self) -> StorageResult<()> {
        self.conn.execute_batch(
            "
            DELETE FROM pages;
            DELETE FROM projects;
        ",
        )?;
        Ok(())
    }
}
