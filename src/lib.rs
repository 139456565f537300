#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! assodb - schema bootstrap and migrations for an association's records
//!
//! assodb owns the persisted data model of a small association (events and
//! their dynamic sub-forms, members, donations, expenses, the accounting
//! journal, inventory stock and the refreshment stand) and the safe evolution
//! path of that model. It can be used as both a command-line application and a
//! library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | `assodb`, `init_db` and `migrate_db` binaries | All above + `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`database`]**: SQLite connection, baseline schema, migrations
//! - **[`config`]**: Configuration management and database info helpers
//! - **[`output`]**: Output formats shared by all commands
//! - **`logging`**: Log subscriber setup (requires `cli`)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use assodb::AssociationDatabase;
//!
//! // Fresh file: create the baseline tables
//! let db = AssociationDatabase::open("association.db")?;
//! db.initialize()?;
//!
//! // Existing file: bring it forward
//! let db = AssociationDatabase::open_existing("./data/database.db")?;
//! let report = db.migrate()?;
//! for failure in report.failures() {
//!     eprintln!("{}: {}", failure.statement, failure.error);
//! }
//! ```

pub mod config;
pub mod database;
pub mod output;

#[cfg(feature = "cli")]
pub mod logging;

// =============================================================================
// Configuration
// =============================================================================

pub use config::AssoConfig;

pub use config::{
    format_size, get_database_info, DatabaseInfo, DATABASE_PATH_ENV, DEFAULT_DATABASE_PATH,
    DEFAULT_INIT_DATABASE_PATH,
};

// =============================================================================
// Database Module
// =============================================================================

pub use database::{AssociationDatabase, TableSummary};

pub use database::{DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus};

pub use database::{
    ColumnSet, Migration, MigrationOutcome, MigrationProgress, MigrationProgressCallback,
    MigrationRecord, MigrationReport, MigrationRunner, StatementFailure, MIGRATIONS,
};

pub use output::OutputFormat;
