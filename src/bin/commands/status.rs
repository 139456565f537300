use assodb::{format_size, get_database_info, AssoConfig, DatabaseInfo, OutputFormat};
use clap::Args;
use tabled::Tabled;

use super::print_json;

/// Arguments for the Status command
#[derive(Args)]
pub struct StatusArgs {
    /// Database file to inspect (default: database_path from config)
    #[clap(value_name = "PATH")]
    pub path: Option<String>,
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "Table")]
    name: String,
    #[tabled(rename = "Rows")]
    rows: u64,
    #[tabled(rename = "Columns")]
    columns: String,
}

pub fn run(config: &AssoConfig, args: StatusArgs, output_format: OutputFormat) {
    let path = args.path.unwrap_or_else(|| config.database_path.clone());

    let info = match get_database_info(&path) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("ERROR: Failed to read database {}: {}", path, e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json(&info, output_format);
    } else {
        print_status(&info, output_format);
    }
}

fn print_status(info: &DatabaseInfo, output_format: OutputFormat) {
    println!("Database Status");
    println!("===============\n");

    println!("  Path:           {}", info.path);
    if !info.exists {
        println!("  Status:         not created (run: assodb init)");
        return;
    }
    if let Some(size) = info.size_bytes {
        println!("  Size:           {}", format_size(size));
    }
    if let Some(ref modified) = info.modified {
        println!("  Modified:       {}", modified);
    }
    if let Some(ref schema) = info.schema {
        println!("  Schema:         {}", schema);
    }

    println!();
    if info.pending_migrations.is_empty() {
        println!("Migrations:       up to date");
    } else {
        println!("Pending migrations (run: assodb migrate):");
        for description in &info.pending_migrations {
            println!("  - {}", description);
        }
    }

    if info.tables.is_empty() {
        return;
    }

    println!();
    let rows: Vec<TableRow> = info
        .tables
        .iter()
        .map(|t| TableRow {
            name: t.name.clone(),
            rows: t.rows,
            columns: t.columns.join(", "),
        })
        .collect();
    println!("{}", output_format.render_rows(&rows));
}
