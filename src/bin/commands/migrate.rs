use assodb::{AssoConfig, AssociationDatabase, MigrationProgress, MigrationReport, OutputFormat};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use tabled::Tabled;

use super::{print_json, print_json_list};

/// Arguments for the Migrate command
#[derive(Args)]
pub struct MigrateArgs {
    /// Database file to migrate (default: database_path from config or DATABASE_PATH)
    #[clap(value_name = "PATH")]
    pub path: Option<String>,

    /// Only list the migrations that would run
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct PendingRow {
    #[tabled(rename = "Migration")]
    description: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Statements")]
    statements: usize,
}

#[derive(Debug, Serialize)]
struct MigrateOutput<'a> {
    path: &'a str,
    success: bool,
    #[serde(flatten)]
    report: &'a MigrationReport,
}

pub fn run(config: &AssoConfig, args: MigrateArgs, output_format: OutputFormat) {
    let MigrateArgs { path, dry_run } = args;
    let path = path.unwrap_or_else(|| config.database_path.clone());

    // Missing file: refuse before any SQL is issued
    let db = match AssociationDatabase::open_existing(&path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("Run `assodb init` to create a database first.");
            std::process::exit(1);
        }
    };

    if dry_run {
        run_dry(db, output_format);
        return;
    }

    let result = if output_format.is_json() {
        db.migrate()
    } else {
        println!("Migrating {}", path);
        db.migrate_with_progress(Arc::new(|progress: MigrationProgress| {
            println!("{}", progress)
        }))
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Migration failed: {}", e);
            drop(db);
            std::process::exit(1);
        }
    };
    drop(db);

    if output_format.is_json() {
        print_json(
            &MigrateOutput {
                path: &path,
                success: true,
                report: &report,
            },
            output_format,
        );
    } else if report.failures().is_empty() {
        println!("✓ Migrations completed successfully");
    } else {
        println!(
            "✓ Migrations completed with {} failed statement(s); see messages above",
            report.failures().len()
        );
    }
}

fn run_dry(db: AssociationDatabase, output_format: OutputFormat) {
    let pending = db.pending_migrations().map(|pending| {
        pending
            .iter()
            .map(|m| PendingRow {
                description: m.description.to_string(),
                table: m.table.to_string(),
                statements: m.statements.len(),
            })
            .collect::<Vec<_>>()
    });
    drop(db);

    let rows = match pending {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("ERROR: Failed to inspect database: {}", e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json_list(&rows, output_format);
    } else if rows.is_empty() {
        println!("Database is up to date, no migration needed");
    } else {
        println!("{}", output_format.render_rows(&rows));
    }
}
