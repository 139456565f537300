use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::database::{AssociationDatabase, SchemaStatus, TableSummary};

/// Environment variable overriding the migration target path
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Default file created by the schema initializer
pub const DEFAULT_INIT_DATABASE_PATH: &str = "association.db";

/// Default file brought forward by the migration runner
pub const DEFAULT_DATABASE_PATH: &str = "./data/database.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssoConfig {
    /// Database file the migration runner operates on
    pub database_path: String,

    /// Database file the schema initializer creates
    pub init_database_path: String,

    /// Configuration file that was read, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
}

const EMPTY_CONFIG: &str = r#"### assodb configuration file

### database file brought forward by `assodb migrate` (DATABASE_PATH overrides it)
# database_path = "./data/database.db"

### database file created by `assodb init`
# init_database_path = "association.db"
"#;

impl Default for AssoConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            init_database_path: DEFAULT_INIT_DATABASE_PATH.to_string(),
            config_file: None,
        }
    }
}

impl AssoConfig {
    /// Function to create and initialize a new configuration
    ///
    /// Sources, lowest precedence first: defaults, the TOML file, `ASSODB_*`
    /// environment variables, then `DATABASE_PATH`.
    pub fn new(path: &Option<String>) -> Result<AssoConfig> {
        let mut builder = Config::builder();

        let config_file = match path {
            Some(p) => {
                if !Path::new(p.as_str()).exists() {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file {}: {}", p, e))?;
                }
                Some(p.clone())
            }
            None => Self::discover_config_file(),
        };

        if let Some(p) = &config_file {
            builder = builder.add_source(config::File::with_name(p.as_str()));
        }

        // E.g., `ASSODB_INIT_DATABASE_PATH=club.db assodb init`
        builder = builder.add_source(config::Environment::with_prefix("ASSODB"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let map = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let mut config = Self::from_map(&map, std::env::var(DATABASE_PATH_ENV).ok());
        config.config_file = config_file;
        Ok(config)
    }

    /// Build a configuration from already-merged settings
    fn from_map(map: &HashMap<String, String>, database_path_env: Option<String>) -> AssoConfig {
        let database_path = database_path_env
            .filter(|p| !p.trim().is_empty())
            .or_else(|| map.get("database_path").cloned())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let init_database_path = map
            .get("init_database_path")
            .cloned()
            .unwrap_or_else(|| DEFAULT_INIT_DATABASE_PATH.to_string());

        AssoConfig {
            database_path,
            init_database_path,
            config_file: None,
        }
    }

    /// Look for `./assodb.toml`, then `$HOME/.assodb/assodb.toml`
    fn discover_config_file() -> Option<String> {
        let local = "assodb.toml".to_string();
        if Path::new(&local).exists() {
            return Some(local);
        }
        let home = Self::config_file_path();
        if Path::new(&home).exists() {
            return Some(home);
        }
        None
    }

    /// Get the per-user config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{}/.assodb/assodb.toml", home_dir)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!(
                "Config File:        {}",
                self.config_file.as_deref().unwrap_or("(none)")
            ),
            format!("Database Path:      {}", self.database_path),
            format!("Init Database Path: {}", self.init_database_path),
        ]
        .join("\n")
    }
}

// =============================================================================
// Shared Database Info Types (used by the status and config commands)
// =============================================================================

/// Information about a database file
#[derive(Debug, Serialize, Clone)]
pub struct DatabaseInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaStatus>,
    pub pending_migrations: Vec<String>,
    pub tables: Vec<TableSummary>,
}

/// Collect information about the database at `path`
///
/// Never creates the file. Errors while reading an existing file are
/// returned so callers can report them.
pub fn get_database_info(path: &str) -> Result<DatabaseInfo> {
    let exists = Path::new(path).is_file();
    let mut info = DatabaseInfo {
        path: path.to_string(),
        exists,
        size_bytes: None,
        modified: None,
        schema: None,
        pending_migrations: Vec::new(),
        tables: Vec::new(),
    };

    if !exists {
        return Ok(info);
    }

    if let Ok(meta) = std::fs::metadata(path) {
        info.size_bytes = Some(meta.len());
        info.modified = meta.modified().ok().map(|t| {
            DateTime::<Local>::from(t)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        });
    }

    let db = AssociationDatabase::open_existing(path)?;
    info.schema = Some(db.schema_status()?);
    info.pending_migrations = db
        .pending_migrations()?
        .iter()
        .map(|m| m.description.to_string())
        .collect();
    info.tables = db.table_summaries()?;

    Ok(info)
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssoConfig::default();
        assert_eq!(config.database_path, "./data/database.db");
        assert_eq!(config.init_database_path, "association.db");
    }

    #[test]
    fn test_from_map_defaults() {
        let config = AssoConfig::from_map(&HashMap::new(), None);
        assert_eq!(config, AssoConfig::default());
    }

    #[test]
    fn test_from_map_file_values() {
        let mut map = HashMap::new();
        map.insert("database_path".to_string(), "/srv/asso.db".to_string());
        map.insert("init_database_path".to_string(), "club.db".to_string());

        let config = AssoConfig::from_map(&map, None);
        assert_eq!(config.database_path, "/srv/asso.db");
        assert_eq!(config.init_database_path, "club.db");
    }

    #[test]
    fn test_database_path_env_wins() {
        let mut map = HashMap::new();
        map.insert("database_path".to_string(), "/srv/asso.db".to_string());

        let config = AssoConfig::from_map(&map, Some("/tmp/override.db".to_string()));
        assert_eq!(config.database_path, "/tmp/override.db");

        // An empty variable is ignored
        let config = AssoConfig::from_map(&map, Some("  ".to_string()));
        assert_eq!(config.database_path, "/srv/asso.db");
    }

    #[test]
    fn test_explicit_config_file_is_created_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assodb.toml");
        let path_str = path.to_str().unwrap().to_string();

        let config = AssoConfig::new(&Some(path_str.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_file.as_deref(), Some(path_str.as_str()));
        assert_eq!(config.init_database_path, "association.db");

        std::fs::write(&path, "init_database_path = \"club.db\"\n").unwrap();
        let config = AssoConfig::new(&Some(path_str)).unwrap();
        assert_eq!(config.init_database_path, "club.db");
    }

    #[test]
    fn test_database_info_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        let info = get_database_info(path.to_str().unwrap()).unwrap();
        assert!(!info.exists);
        assert!(info.schema.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_database_info_initialized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("association.db");
        let path_str = path.to_str().unwrap();

        AssociationDatabase::open(path_str)
            .unwrap()
            .initialize()
            .unwrap();

        let info = get_database_info(path_str).unwrap();
        assert!(info.exists);
        assert!(info.size_bytes.is_some());
        assert_eq!(info.schema, Some(SchemaStatus::Current));
        assert_eq!(
            info.pending_migrations.len(),
            crate::database::MIGRATIONS.len()
        );
        assert!(info.tables.iter().any(|t| t.name == "events"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }
}
