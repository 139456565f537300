//! Database connection management
//!
//! This module provides the SQLite connection wrapper shared by the schema
//! initializer and the migration runner.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// Core database connection wrapper
///
/// `DatabaseConn` owns exactly one SQLite connection. Dropping it closes the
/// handle, so every exit path (including errors) releases the file.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    /// A file that does not exist yet is created by SQLite.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure()?;
        Ok(db)
    }

    /// Open a database at the specified path (convenience method)
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    /// Open an existing database file
    ///
    /// Fails without touching the filesystem when `path` does not exist, so a
    /// mistyped path never leaves an empty database file behind.
    pub fn open_existing(path: &str) -> Result<Self> {
        if !Path::new(path).is_file() {
            return Err(anyhow!("Database file does not exist: {}", path));
        }
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self) -> Result<()> {
        // Cascading deletes are declared on every foreign key and need this pragma
        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        Ok(())
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM \"{}\"", table_name);
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get table count: {}", e))?;
        Ok(count)
    }

    /// List the column names of a table, in declaration order
    ///
    /// Returns an empty list when the table does not exist.
    pub fn table_columns(&self, table_name: &str) -> Result<Vec<String>> {
        table_columns(&self.conn, table_name)
    }
}

/// Check if a table exists on any connection (or transaction)
pub fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i32 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table_name],
            |row| row.get(0),
        )
        .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
    Ok(count > 0)
}

/// Introspect a table's columns with `PRAGMA table_info`
///
/// SQLite answers the pragma with zero rows for an unknown table, which is
/// what lets a trigger predicate treat "no table" the same as "no column".
pub fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .map_err(|e| anyhow!("Failed to inspect table '{}': {}", table_name, e))?;

    let columns = stmt
        .query_map([table_name], |row| row.get::<_, String>(0))
        .map_err(|e| anyhow!("Failed to inspect table '{}': {}", table_name, e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| anyhow!("Failed to read columns of '{}': {}", table_name, e))?;

    debug!("table {} has {} column(s)", table_name, columns.len());
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let enabled: i32 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.conn
            .execute_batch("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(table_exists(&db.conn, "test_table").unwrap());
        assert!(!table_exists(&db.conn, "nonexistent_table").unwrap());
    }

    #[test]
    fn test_table_count() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TABLE test_table (id INTEGER PRIMARY KEY);
                 INSERT INTO test_table (id) VALUES (1), (2), (3);",
            )
            .unwrap();

        assert_eq!(db.table_count("test_table").unwrap(), 3);
    }

    #[test]
    fn test_table_columns() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.conn
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, stock INTEGER)")
            .unwrap();

        assert_eq!(db.table_columns("t").unwrap(), vec!["id", "name", "stock"]);
        assert!(db.table_columns("missing").unwrap().is_empty());
    }

    #[test]
    fn test_open_existing_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let path_str = path.to_str().unwrap();

        let result = DatabaseConn::open_existing(path_str);
        assert!(result.is_err());
        // The failed open must not create the file
        assert!(!path.exists());
    }

    #[test]
    fn test_open_existing_present_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("present.db");
        let path_str = path.to_str().unwrap();

        let db = DatabaseConn::open_path(path_str).unwrap();
        db.conn
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .unwrap();
        drop(db);

        assert!(DatabaseConn::open_existing(path_str).is_ok());
    }
}
