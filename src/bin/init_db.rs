//! Standalone schema initializer
//!
//! Creates the baseline tables in `init_database_path` (default
//! `association.db`). Takes no arguments.

use assodb::database::ensure_parent_dir;
use assodb::logging::init_logging;
use assodb::{AssoConfig, AssociationDatabase};

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
    let path = config.init_database_path.as_str();

    let result = ensure_parent_dir(path)
        .and_then(|_| AssociationDatabase::open(path))
        .and_then(|db| db.initialize());

    match result {
        Ok(()) => println!("✓ Database {} initialized", path),
        Err(e) => {
            eprintln!("ERROR: Failed to initialize database {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
