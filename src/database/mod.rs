//! Database module
//!
//! This module provides all database functionality for assodb, organized into:
//!
//! - **core**: SQLite connection wrapper and the baseline schema
//! - **migration**: ordered, additive, introspection-driven schema changes
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── schema      # Baseline table definitions (create if not exists)
//! │
//! └── migration/      # Schema evolution
//!     └── registry    # The ordered descriptor list
//! ```
//!
//! # Lifecycle
//!
//! The schema initializer creates the baseline table set on a fresh file; the
//! migration runner then brings any existing file forward. Application code
//! reads and writes rows with ordinary SQL once both have run.
//!
//! ```rust,ignore
//! use assodb::database::AssociationDatabase;
//!
//! let db = AssociationDatabase::open("association.db")?;
//! db.initialize()?;
//!
//! let db = AssociationDatabase::open_existing("./data/database.db")?;
//! let report = db.migrate()?;
//! println!("{} migration(s) applied", report.applied_count());
//! ```

pub mod core;
pub mod migration;

pub use core::{
    table_columns, table_exists, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus,
};
pub use migration::{
    ColumnSet, Migration, MigrationOutcome, MigrationProgress, MigrationProgressCallback,
    MigrationRecord, MigrationReport, MigrationRunner, StatementFailure, TriggerFn, MIGRATIONS,
};

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Row count and column list for one table
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: u64,
    pub columns: Vec<String>,
}

/// The association database
///
/// Owns one connection for its whole lifetime. Dropping it releases the file
/// handle on every path, including after an error.
pub struct AssociationDatabase {
    db: DatabaseConn,
}

impl AssociationDatabase {
    /// Open the database at `path`, creating the file if it does not exist
    pub fn open(path: &str) -> Result<Self> {
        let db = DatabaseConn::open_path(path)?;
        Ok(Self { db })
    }

    /// Open a database file that must already exist
    ///
    /// Used by the migration entry points: a missing file is an error and no
    /// SQL is issued.
    pub fn open_existing(path: &str) -> Result<Self> {
        let db = DatabaseConn::open_existing(path)?;
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let db = DatabaseConn::open_in_memory()?;
        Ok(Self { db })
    }

    /// Create the baseline table set if absent
    pub fn initialize(&self) -> Result<()> {
        SchemaManager::new(&self.db.conn).initialize()
    }

    /// Current baseline schema status
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        SchemaManager::new(&self.db.conn).check_status()
    }

    /// Run all built-in migrations
    pub fn migrate(&self) -> Result<MigrationReport> {
        MigrationRunner::new(&self.db.conn).run()
    }

    /// Run all built-in migrations, reporting progress through `callback`
    pub fn migrate_with_progress(
        &self,
        callback: MigrationProgressCallback,
    ) -> Result<MigrationReport> {
        MigrationRunner::new(&self.db.conn)
            .with_progress(callback)
            .run()
    }

    /// Built-in migrations whose trigger currently evaluates true
    pub fn pending_migrations(&self) -> Result<Vec<&Migration>> {
        MigrationRunner::new(&self.db.conn).plan()
    }

    /// Row counts and columns of every user table, sorted by name
    pub fn table_summaries(&self) -> Result<Vec<TableSummary>> {
        let names = SchemaManager::new(&self.db.conn).table_names()?;
        names
            .into_iter()
            .map(|name| {
                let rows = self.db.table_count(&name)?;
                let columns = self.db.table_columns(&name)?;
                Ok(TableSummary {
                    name,
                    rows,
                    columns,
                })
            })
            .collect()
    }

    /// Write a consistent snapshot of the database to `destination`
    ///
    /// The destination must not exist yet.
    pub fn backup_to(&self, destination: &Path) -> Result<()> {
        if destination.exists() {
            return Err(anyhow!(
                "Backup destination already exists: {}",
                destination.display()
            ));
        }
        let dest = destination
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert backup path to string"))?;

        self.db
            .conn
            .execute("VACUUM INTO ?1", [dest])
            .map_err(|e| anyhow!("Failed to back up database to '{}': {}", dest, e))?;

        info!("database backed up to {}", dest);
        Ok(())
    }

    /// Get the underlying database connection
    ///
    /// Application code uses this for ordinary row reads and writes.
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.db.conn
    }
}

/// Ensure the parent directory of a database file exists
pub fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow!(
                    "Failed to create data directory '{}': {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }
    Ok(())
}
