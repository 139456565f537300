//! Standalone migration runner
//!
//! Brings the database at `DATABASE_PATH` (default `./data/database.db`)
//! forward. Takes no arguments. Exits with status 1, without issuing any SQL,
//! when the file does not exist.

use assodb::logging::init_logging;
use assodb::{AssoConfig, AssociationDatabase, MigrationProgress};
use std::sync::Arc;

fn main() {
    let _ = dotenvy::dotenv();
    init_logging(false);

    let config = match AssoConfig::new(&None) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let path = config.database_path.as_str();

    let db = match AssociationDatabase::open_existing(path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("✗ Migration aborted");
            std::process::exit(1);
        }
    };

    println!("Migrating {}", path);
    let result = db.migrate_with_progress(Arc::new(|progress: MigrationProgress| {
        println!("{}", progress)
    }));
    drop(db);

    match result {
        Ok(report) if report.failures().is_empty() => {
            println!("✓ Migrations completed successfully")
        }
        Ok(report) => println!(
            "✓ Migrations completed with {} failed statement(s)",
            report.failures().len()
        ),
        Err(e) => {
            eprintln!("ERROR: Migration failed: {}", e);
            eprintln!("✗ Migration aborted");
            std::process::exit(1);
        }
    }
}
