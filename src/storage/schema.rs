//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SEO Wayfinder database.

/// Version stamped into `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Named groups of saved crawl results
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- One extracted page per project and URL, stored as JSON
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    saved_at TEXT NOT NULL,
    record TEXT NOT NULL,
    UNIQUE(project_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_project ON pages(project_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}
