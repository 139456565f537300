//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `DatabaseConn`: Core SQLite connection wrapper with configuration
//! - `SchemaManager`: Baseline schema initialization and status checks
//! - `SchemaStatus`: Schema state enumeration

mod connection;
mod schema;

pub use connection::{table_columns, table_exists, DatabaseConn};
pub use schema::{SchemaDefinitions, SchemaManager, SchemaStatus};
