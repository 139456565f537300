//! Database schema management
//!
//! This module holds the baseline table definitions for the association
//! database and the manager that applies them. There is no stored schema
//! version: the state of a file is always derived by looking at which tables
//! exist. Later additive changes live in [`crate::database::migration`].

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use super::connection::table_exists;

/// Schema definitions for all baseline tables
///
/// Every definition uses `CREATE TABLE IF NOT EXISTS`, so applying the whole
/// list to an initialized file is a no-op.
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    pub const EVENTS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            date TEXT,
            location TEXT,
            comment TEXT
        );
    "#;

    /// Named sub-forms attached to an event
    pub const EVENT_MODULES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS event_modules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL,
            module_name TEXT NOT NULL,
            FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
        );
    "#;

    /// Typed columns defined for an event module
    pub const EVENT_MODULE_FIELDS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS event_module_fields (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            module_id INTEGER NOT NULL,
            field_name TEXT NOT NULL,
            field_type TEXT NOT NULL,
            FOREIGN KEY (module_id) REFERENCES event_modules(id) ON DELETE CASCADE
        );
    "#;

    /// One cell of dynamic tabular data, keyed by (module, row, field)
    pub const EVENT_MODULE_DATA_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS event_module_data (
            module_id INTEGER NOT NULL,
            row_index INTEGER NOT NULL,
            field_id INTEGER NOT NULL,
            value TEXT,
            PRIMARY KEY (module_id, row_index, field_id),
            FOREIGN KEY (module_id) REFERENCES event_modules(id) ON DELETE CASCADE,
            FOREIGN KEY (field_id) REFERENCES event_module_fields(id) ON DELETE CASCADE
        );
    "#;

    pub const MEMBERS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            email TEXT,
            class_group TEXT,
            dues REAL,
            comment TEXT
        );
    "#;

    /// Donations and subsidies
    pub const DONATIONS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS donations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            donor TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT,
            comment TEXT
        );
    "#;

    pub const RECURRING_EXPENSES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS recurring_expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT,
            category TEXT,
            comment TEXT
        );
    "#;

    pub const MISC_EXPENSES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS misc_expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT,
            category TEXT,
            comment TEXT
        );
    "#;

    /// Accounting journal (one ledger line per row)
    pub const JOURNAL_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS journal (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            label TEXT NOT NULL,
            amount REAL NOT NULL,
            entry_type TEXT NOT NULL,
            category TEXT,
            comment TEXT
        );
    "#;

    /// Category tree, self-referential through `parent_id`
    pub const CATEGORIES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            parent_id INTEGER,
            FOREIGN KEY (parent_id) REFERENCES categories(id) ON DELETE CASCADE
        );
    "#;

    pub const STOCK_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS stock (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category_id INTEGER,
            quantity INTEGER NOT NULL DEFAULT 0,
            alert_threshold INTEGER,
            expiration_date TEXT,
            lot TEXT,
            comment TEXT,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        );
    "#;

    /// All baseline tables in creation order (parents before children)
    pub const TABLES: &'static [(&'static str, &'static str)] = &[
        ("events", Self::EVENTS_TABLE),
        ("event_modules", Self::EVENT_MODULES_TABLE),
        ("event_module_fields", Self::EVENT_MODULE_FIELDS_TABLE),
        ("event_module_data", Self::EVENT_MODULE_DATA_TABLE),
        ("members", Self::MEMBERS_TABLE),
        ("donations", Self::DONATIONS_TABLE),
        ("recurring_expenses", Self::RECURRING_EXPENSES_TABLE),
        ("misc_expenses", Self::MISC_EXPENSES_TABLE),
        ("journal", Self::JOURNAL_TABLE),
        ("categories", Self::CATEGORIES_TABLE),
        ("stock", Self::STOCK_TABLE),
    ];

    /// Names of all baseline tables
    pub fn table_names() -> impl Iterator<Item = &'static str> {
        Self::TABLES.iter().map(|(name, _)| *name)
    }
}

/// Schema manager for the association database
///
/// Handles baseline initialization and schema status checks.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Initialize the database schema
    ///
    /// Creates every baseline table that does not exist yet. All definitions
    /// run in a single transaction: either the whole table set is committed
    /// or, on the first storage error, nothing is.
    pub fn initialize(&self) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin schema transaction: {}", e))?;

        for (name, sql) in SchemaDefinitions::TABLES {
            tx.execute_batch(sql)
                .map_err(|e| anyhow!("Failed to create {} table: {}", name, e))?;
        }

        tx.commit()
            .map_err(|e| anyhow!("Failed to commit schema: {}", e))?;

        info!(
            "database schema initialized ({} tables)",
            SchemaDefinitions::TABLES.len()
        );
        Ok(())
    }

    /// Check the current schema status
    pub fn check_status(&self) -> Result<SchemaStatus> {
        let missing = self.verify_integrity()?;

        if missing.len() == SchemaDefinitions::TABLES.len() {
            Ok(SchemaStatus::NotInitialized)
        } else if missing.is_empty() {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::Incomplete { missing })
        }
    }

    /// Verify schema integrity
    ///
    /// Returns the baseline tables that are missing from the database, in
    /// declaration order. An empty list means the baseline is complete.
    pub fn verify_integrity(&self) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for table in SchemaDefinitions::table_names() {
            if !table_exists(self.conn, table)? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    /// List all user tables present in the database, sorted by name
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(|e| anyhow!("Failed to list tables: {}", e))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| anyhow!("Failed to list tables: {}", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| anyhow!("Failed to read table names: {}", e))?;
        Ok(names)
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchemaStatus {
    /// None of the baseline tables exist (fresh database)
    NotInitialized,

    /// Some baseline tables are missing
    Incomplete { missing: Vec<String> },

    /// All baseline tables exist
    Current,
}

impl std::fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaStatus::NotInitialized => write!(f, "not initialized"),
            SchemaStatus::Incomplete { missing } => {
                write!(f, "incomplete (missing: {})", missing.join(", "))
            }
            SchemaStatus::Current => write!(f, "current"),
        }
    }
}
