use assodb::{AssoConfig, AssociationDatabase, OutputFormat};
use chrono::Local;
use clap::Args;
use serde_json::json;
use std::path::{Path, PathBuf};

use super::print_json;

/// Arguments for the Backup command
#[derive(Args)]
pub struct BackupArgs {
    /// Destination file, or directory to receive a timestamped copy
    #[clap(value_name = "DEST")]
    pub destination: String,

    /// Database file to back up (default: database_path from config)
    #[clap(value_name = "PATH")]
    pub path: Option<String>,
}

pub fn run(config: &AssoConfig, args: BackupArgs, output_format: OutputFormat) {
    let BackupArgs { destination, path } = args;
    let path = path.unwrap_or_else(|| config.database_path.clone());

    let db = match AssociationDatabase::open_existing(&path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let dest_file = match resolve_destination(&destination, &path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: Failed to create destination directory: {}", e);
            drop(db);
            std::process::exit(1);
        }
    };

    if !output_format.is_json() {
        eprintln!("Backing up database...");
    }
    let result = db.backup_to(&dest_file);
    drop(db);
    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }

    if output_format.is_json() {
        print_json(
            &json!({
                "success": true,
                "source": path,
                "file": dest_file.to_string_lossy(),
            }),
            output_format,
        );
    } else {
        println!("✓ Backup completed successfully");
        println!("  {}", dest_file.display());
    }
}

/// Directory destinations get `<stem>-<timestamp>.db`; parent directories are created
///
/// The timestamp has millisecond precision. If that name is still taken, a
/// `-1`, `-2`, ... suffix is appended until it is free.
fn resolve_destination(destination: &str, source: &str) -> std::io::Result<PathBuf> {
    let dest_path = Path::new(destination);

    if dest_path.is_dir() || destination.ends_with('/') {
        std::fs::create_dir_all(dest_path)?;
        let stem = Path::new(source)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "database".to_string());
        let stamp = Local::now().format("%Y%m%d-%H%M%S-%3f").to_string();
        return Ok(unique_backup_path(dest_path, &stem, &stamp));
    }

    if let Some(parent) = dest_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(dest_path.to_path_buf())
}

fn unique_backup_path(dir: &Path, stem: &str, stamp: &str) -> PathBuf {
    let candidate = dir.join(format!("{}-{}.db", stem, stamp));
    if !candidate.exists() {
        return candidate;
    }
    (1u32..)
        .map(|n| dir.join(format!("{}-{}-{}.db", stem, stamp, n)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
