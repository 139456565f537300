use assodb::database::ensure_parent_dir;
use assodb::{AssoConfig, AssociationDatabase, OutputFormat, SchemaDefinitions};
use clap::Args;
use serde_json::json;

use super::print_json;

/// Arguments for the Init command
#[derive(Args)]
pub struct InitArgs {
    /// Database file to initialize (default: init_database_path from config)
    #[clap(value_name = "PATH")]
    pub path: Option<String>,
}

pub fn run(config: &AssoConfig, args: InitArgs, output_format: OutputFormat) {
    let path = args
        .path
        .unwrap_or_else(|| config.init_database_path.clone());

    if let Err(e) = ensure_parent_dir(&path) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }

    let result = AssociationDatabase::open(&path).and_then(|db| db.initialize());

    if let Err(e) = result {
        eprintln!("ERROR: Failed to initialize database {}: {}", path, e);
        std::process::exit(1);
    }

    if output_format.is_json() {
        print_json(
            &json!({
                "success": true,
                "path": path,
                "tables": SchemaDefinitions::table_names().collect::<Vec<_>>(),
            }),
            output_format,
        );
    } else {
        println!(
            "✓ Database {} initialized ({} tables)",
            path,
            SchemaDefinitions::TABLES.len()
        );
    }
}
