//! Additive schema migrations
//!
//! A [`Migration`] is a descriptor: a description, the table it inspects, the
//! statements it runs, and a trigger predicate over that table's current
//! columns. The runner walks the descriptors in declaration order and runs a
//! descriptor's statements only when its trigger says the change is still
//! missing. Nothing records which migrations ran; applicability is derived
//! from `PRAGMA table_info` on every run, which is what makes repeated runs
//! no-ops.
//!
//! # Failure policy
//!
//! Statement failures are logged, recorded in the [`MigrationReport`] and
//! skipped. The runner then moves on to the next statement and the next
//! descriptor. Whatever did not stick is retried by the next run, since the
//! trigger still sees the change as missing. Storage errors outside a
//! statement (opening the transaction, introspection, the final commit) are
//! returned as errors.
//!
//! # Adding a migration
//!
//! Append a descriptor to [`MIGRATIONS`]. Never reorder or remove entries.
//!
//! ```rust,ignore
//! use assodb::database::{ColumnSet, Migration};
//!
//! fn lacks_member_phone(columns: &ColumnSet) -> bool {
//!     columns.lacks("phone")
//! }
//!
//! Migration {
//!     description: "Add phone to members",
//!     table: "members",
//!     statements: &["ALTER TABLE members ADD COLUMN phone TEXT"],
//!     trigger: lacks_member_phone,
//! }
//! ```

mod registry;

pub use registry::MIGRATIONS;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::core::table_columns;

/// Trigger predicate: returns `true` while the migration is still needed
pub type TriggerFn = fn(&ColumnSet) -> bool;

/// One migration unit
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Human-readable description, used in progress output and reports
    pub description: &'static str,
    /// Table whose columns are handed to the trigger
    pub table: &'static str,
    /// Additive statements, executed in order
    pub statements: &'static [&'static str],
    /// Decides from the current column list whether the statements must run
    pub trigger: TriggerFn,
}

impl Migration {
    /// Evaluate the trigger predicate against a column set
    pub fn is_needed(&self, columns: &ColumnSet) -> bool {
        (self.trigger)(columns)
    }
}

/// The column names of one table, as reported by introspection
///
/// A table that does not exist yields an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<String>,
}

impl ColumnSet {
    /// Read the current columns of `table`
    pub fn introspect(conn: &Connection, table: &str) -> Result<Self> {
        Ok(Self {
            columns: table_columns(conn, table)?,
        })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn lacks(&self, column: &str) -> bool {
        !self.contains(column)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Reporting Types
// =============================================================================

/// A statement that failed during a migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFailure {
    pub statement: String,
    pub error: String,
}

/// What happened to one descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// The trigger evaluated false; nothing was executed
    UpToDate,
    /// The trigger evaluated true and the statements were attempted
    Applied {
        executed: usize,
        failures: Vec<StatementFailure>,
    },
}

/// Report line for one descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub description: String,
    pub table: String,
    #[serde(flatten)]
    pub outcome: MigrationOutcome,
}

/// Result of a full migration run, one record per descriptor in run order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub records: Vec<MigrationRecord>,
}

impl MigrationReport {
    /// Number of descriptors whose statements were attempted
    pub fn applied_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, MigrationOutcome::Applied { .. }))
            .count()
    }

    /// Number of descriptors that were already up to date
    pub fn up_to_date_count(&self) -> usize {
        self.records.len() - self.applied_count()
    }

    /// Number of statements that executed successfully
    pub fn statements_executed(&self) -> usize {
        self.records
            .iter()
            .map(|r| match &r.outcome {
                MigrationOutcome::Applied { executed, .. } => *executed,
                MigrationOutcome::UpToDate => 0,
            })
            .sum()
    }

    /// All statement failures, in the order they happened
    pub fn failures(&self) -> Vec<&StatementFailure> {
        self.records
            .iter()
            .flat_map(|r| match &r.outcome {
                MigrationOutcome::Applied { failures, .. } => failures.as_slice(),
                MigrationOutcome::UpToDate => &[][..],
            })
            .collect()
    }
}

// =============================================================================
// Progress Tracking Types
// =============================================================================

/// Progress information for migration runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MigrationProgress {
    /// A descriptor's target table is about to be inspected
    Checking {
        /// 1-based position in the run
        index: usize,
        total: usize,
        description: String,
        table: String,
    },
    /// The trigger evaluated true
    Needed { description: String },
    /// A statement failed; the run continues
    StatementFailed {
        description: String,
        statement: String,
        error: String,
    },
    /// All statements of a needed descriptor were attempted
    Applied {
        description: String,
        executed: usize,
        failed: usize,
    },
    /// The trigger evaluated false
    UpToDate { description: String },
    /// The run has been committed
    Completed {
        applied: usize,
        up_to_date: usize,
        failed_statements: usize,
    },
}

impl std::fmt::Display for MigrationProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationProgress::Checking {
                index,
                total,
                description,
                table,
            } => write!(f, "[{}/{}] {} (table {})", index, total, description, table),
            MigrationProgress::Needed { .. } => write!(f, "      needed"),
            MigrationProgress::StatementFailed {
                statement, error, ..
            } => write!(f, "      statement failed: {} ({})", statement, error),
            MigrationProgress::Applied {
                executed, failed, ..
            } => write!(
                f,
                "      applied: {} statement(s) executed, {} failed",
                executed, failed
            ),
            MigrationProgress::UpToDate { .. } => write!(f, "      already up to date"),
            MigrationProgress::Completed {
                applied,
                up_to_date,
                failed_statements,
            } => write!(
                f,
                "{} applied, {} already up to date, {} failed statement(s)",
                applied, up_to_date, failed_statements
            ),
        }
    }
}

/// Type alias for migration progress callbacks
pub type MigrationProgressCallback = Arc<dyn Fn(MigrationProgress) + Send + Sync>;

// =============================================================================
// Runner
// =============================================================================

/// Applies descriptors to one connection
pub struct MigrationRunner<'a> {
    conn: &'a Connection,
    migrations: &'a [Migration],
    progress: Option<MigrationProgressCallback>,
}

impl<'a> MigrationRunner<'a> {
    /// Create a runner over the built-in [`MIGRATIONS`] list
    pub fn new(conn: &'a Connection) -> Self {
        Self::with_migrations(conn, MIGRATIONS)
    }

    /// Create a runner over a custom descriptor list
    pub fn with_migrations(conn: &'a Connection, migrations: &'a [Migration]) -> Self {
        Self {
            conn,
            migrations,
            progress: None,
        }
    }

    /// Attach a progress callback
    pub fn with_progress(mut self, callback: MigrationProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, event: MigrationProgress) {
        if let Some(cb) = &self.progress {
            cb(event);
        }
    }

    /// Return the descriptors whose trigger currently evaluates true
    ///
    /// Executes no statements. Because later descriptors may depend on
    /// earlier ones, the plan reflects the database as it is now, not as it
    /// would be mid-run.
    pub fn plan(&self) -> Result<Vec<&'a Migration>> {
        let mut pending = Vec::new();
        for migration in self.migrations {
            let columns = ColumnSet::introspect(self.conn, migration.table)?;
            if migration.is_needed(&columns) {
                pending.push(migration);
            }
        }
        Ok(pending)
    }

    /// Run every descriptor in declaration order
    ///
    /// All work happens in one transaction that is committed once at the end.
    /// Failed statements are recorded and skipped (see the module docs).
    pub fn run(&self) -> Result<MigrationReport> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin migration transaction: {}", e))?;

        let total = self.migrations.len();
        let mut report = MigrationReport::default();

        for (i, migration) in self.migrations.iter().enumerate() {
            self.emit(MigrationProgress::Checking {
                index: i + 1,
                total,
                description: migration.description.to_string(),
                table: migration.table.to_string(),
            });

            let columns = ColumnSet::introspect(&tx, migration.table)?;
            debug!(
                "{}: {} has columns [{}]",
                migration.description,
                migration.table,
                columns.iter().collect::<Vec<_>>().join(", ")
            );

            if !migration.is_needed(&columns) {
                info!("{}: already up to date", migration.description);
                self.emit(MigrationProgress::UpToDate {
                    description: migration.description.to_string(),
                });
                report.records.push(MigrationRecord {
                    description: migration.description.to_string(),
                    table: migration.table.to_string(),
                    outcome: MigrationOutcome::UpToDate,
                });
                continue;
            }

            info!("{}: needed", migration.description);
            self.emit(MigrationProgress::Needed {
                description: migration.description.to_string(),
            });

            let mut executed = 0;
            let mut failures = Vec::new();
            for statement in migration.statements {
                match tx.execute_batch(statement) {
                    Ok(()) => executed += 1,
                    Err(e) => {
                        warn!(
                            "{}: statement failed, continuing: {} ({})",
                            migration.description,
                            statement.trim(),
                            e
                        );
                        self.emit(MigrationProgress::StatementFailed {
                            description: migration.description.to_string(),
                            statement: statement.trim().to_string(),
                            error: e.to_string(),
                        });
                        failures.push(StatementFailure {
                            statement: statement.trim().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            info!(
                "{}: applied ({} executed, {} failed)",
                migration.description,
                executed,
                failures.len()
            );
            self.emit(MigrationProgress::Applied {
                description: migration.description.to_string(),
                executed,
                failed: failures.len(),
            });
            report.records.push(MigrationRecord {
                description: migration.description.to_string(),
                table: migration.table.to_string(),
                outcome: MigrationOutcome::Applied { executed, failures },
            });
        }

        tx.commit()
            .map_err(|e| anyhow!("Failed to commit migrations: {}", e))?;

        self.emit(MigrationProgress::Completed {
            applied: report.applied_count(),
            up_to_date: report.up_to_date_count(),
            failed_statements: report.failures().len(),
        });

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::SchemaManager;
    use std::sync::Mutex;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys=ON", []).unwrap();
        conn
    }

    fn column_type(conn: &Connection, table: &str, column: &str) -> Option<String> {
        conn.query_row(
            "SELECT type FROM pragma_table_info(?1) WHERE name = ?2",
            [table, column],
            |row| row.get(0),
        )
        .ok()
    }

    fn lacks_extra(columns: &ColumnSet) -> bool {
        columns.lacks("extra")
    }

    fn lacks_note(columns: &ColumnSet) -> bool {
        columns.lacks("note")
    }

    #[test]
    fn test_column_set_predicates() {
        let columns: ColumnSet = ["id", "name", "Stock"].into_iter().collect();
        assert!(columns.contains("name"));
        assert!(columns.contains("stock"));
        assert!(columns.lacks("purchase_price"));
        assert_eq!(columns.len(), 3);

        let empty = ColumnSet::default();
        assert!(empty.is_empty());
        assert!(empty.lacks("anything"));
    }

    #[test]
    fn test_introspect_missing_table_is_empty() {
        let conn = create_test_db();
        let columns = ColumnSet::introspect(&conn, "no_such_table").unwrap();
        assert!(columns.is_empty());
    }

    #[test]
    fn test_fresh_database_applies_all() {
        let conn = create_test_db();
        SchemaManager::new(&conn).initialize().unwrap();

        let report = MigrationRunner::new(&conn).run().unwrap();
        assert_eq!(report.applied_count(), MIGRATIONS.len());
        assert!(report.failures().is_empty());

        let columns = ColumnSet::introspect(&conn, "buvette_articles").unwrap();
        for col in [
            "id",
            "name",
            "category",
            "unit",
            "content_size",
            "comment",
            "stock",
            "purchase_price",
        ] {
            assert!(columns.contains(col), "missing {}", col);
        }
    }

    #[test]
    fn test_second_run_is_noop() {
        let conn = create_test_db();
        SchemaManager::new(&conn).initialize().unwrap();

        MigrationRunner::new(&conn).run().unwrap();
        let second = MigrationRunner::new(&conn).run().unwrap();

        assert_eq!(second.applied_count(), 0);
        assert_eq!(second.statements_executed(), 0);
        assert_eq!(second.up_to_date_count(), MIGRATIONS.len());
        assert!(second
            .records
            .iter()
            .all(|r| r.outcome == MigrationOutcome::UpToDate));
    }

    #[test]
    fn test_legacy_buvette_gets_purchase_price() {
        let conn = create_test_db();
        conn.execute_batch(
            r#"
            CREATE TABLE buvette_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT,
                unit TEXT,
                content_size TEXT,
                comment TEXT,
                stock INTEGER DEFAULT 0
            );
            INSERT INTO buvette_articles (name, stock) VALUES ('Pepsi', 5);
            "#,
        )
        .unwrap();

        let report = MigrationRunner::new(&conn).run().unwrap();

        // Table creation is skipped, the column is added
        assert_eq!(report.records[0].outcome, MigrationOutcome::UpToDate);
        assert_eq!(
            report.records[1].outcome,
            MigrationOutcome::Applied {
                executed: 1,
                failures: vec![]
            }
        );
        assert_eq!(
            column_type(&conn, "buvette_articles", "purchase_price").as_deref(),
            Some("REAL")
        );

        let (stock, price): (i64, Option<f64>) = conn
            .query_row(
                "SELECT stock, purchase_price FROM buvette_articles WHERE name = 'Pepsi'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(stock, 5);
        assert_eq!(price, None);
    }

    #[test]
    fn test_failed_statement_does_not_block_later_descriptors() {
        let conn = create_test_db();
        conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")
            .unwrap();

        let migrations = [
            Migration {
                description: "Add extra to ghost",
                table: "ghost",
                statements: &["ALTER TABLE ghost ADD COLUMN extra TEXT"],
                trigger: lacks_extra,
            },
            Migration {
                description: "Add note to notes",
                table: "notes",
                statements: &["ALTER TABLE notes ADD COLUMN note TEXT"],
                trigger: lacks_note,
            },
        ];

        let report = MigrationRunner::with_migrations(&conn, &migrations)
            .run()
            .unwrap();

        match &report.records[0].outcome {
            MigrationOutcome::Applied { executed, failures } => {
                assert_eq!(*executed, 0);
                assert_eq!(failures.len(), 1);
                assert!(failures[0].statement.contains("ghost"));
                assert!(failures[0].error.contains("no such table"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            report.records[1].outcome,
            MigrationOutcome::Applied {
                executed: 1,
                failures: vec![]
            }
        );
        assert!(ColumnSet::introspect(&conn, "notes")
            .unwrap()
            .contains("note"));
    }

    #[test]
    fn test_failed_statement_keeps_rest_of_descriptor() {
        let conn = create_test_db();
        conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, extra TEXT);")
            .unwrap();

        fn lacks_note_or_extra(columns: &ColumnSet) -> bool {
            columns.lacks("note") || columns.lacks("extra")
        }

        let migrations = [Migration {
            description: "Add note and extra to notes",
            table: "notes",
            statements: &[
                "ALTER TABLE notes ADD COLUMN extra TEXT",
                "ALTER TABLE notes ADD COLUMN note TEXT",
            ],
            trigger: lacks_note_or_extra,
        }];

        let report = MigrationRunner::with_migrations(&conn, &migrations)
            .run()
            .unwrap();

        assert_eq!(report.statements_executed(), 1);
        assert_eq!(report.failures().len(), 1);
        assert!(report.failures()[0].error.contains("duplicate column"));
        assert!(ColumnSet::introspect(&conn, "notes")
            .unwrap()
            .contains("note"));
    }

    #[test]
    fn test_plan_executes_nothing() {
        let conn = create_test_db();
        SchemaManager::new(&conn).initialize().unwrap();

        let pending = MigrationRunner::new(&conn).plan().unwrap();
        assert_eq!(pending.len(), MIGRATIONS.len());
        assert!(ColumnSet::introspect(&conn, "buvette_articles")
            .unwrap()
            .is_empty());

        MigrationRunner::new(&conn).run().unwrap();
        assert!(MigrationRunner::new(&conn).plan().unwrap().is_empty());
    }

    #[test]
    fn test_progress_events_in_order() {
        let conn = create_test_db();
        SchemaManager::new(&conn).initialize().unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: MigrationProgressCallback = Arc::new(move |p: MigrationProgress| {
            let tag = match p {
                MigrationProgress::Checking { .. } => "checking",
                MigrationProgress::Needed { .. } => "needed",
                MigrationProgress::StatementFailed { .. } => "failed",
                MigrationProgress::Applied { .. } => "applied",
                MigrationProgress::UpToDate { .. } => "up-to-date",
                MigrationProgress::Completed { .. } => "completed",
            };
            sink.lock().unwrap().push(tag);
        });

        MigrationRunner::new(&conn)
            .with_progress(callback)
            .run()
            .unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "checking",
                "needed",
                "applied",
                "checking",
                "needed",
                "applied",
                "completed"
            ]
        );
    }

    #[test]
    fn test_progress_display() {
        let checking = MigrationProgress::Checking {
            index: 2,
            total: 2,
            description: "Add purchase_price to buvette_articles".to_string(),
            table: "buvette_articles".to_string(),
        };
        assert_eq!(
            checking.to_string(),
            "[2/2] Add purchase_price to buvette_articles (table buvette_articles)"
        );

        let done = MigrationProgress::Completed {
            applied: 0,
            up_to_date: 2,
            failed_statements: 0,
        };
        assert_eq!(
            done.to_string(),
            "0 applied, 2 already up to date, 0 failed statement(s)"
        );
    }

    #[test]
    fn test_report_serializes_outcome_tag() {
        let report = MigrationReport {
            records: vec![MigrationRecord {
                description: "Add purchase_price to buvette_articles".to_string(),
                table: "buvette_articles".to_string(),
                outcome: MigrationOutcome::UpToDate,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["records"][0]["outcome"], "up_to_date");
        assert_eq!(json["records"][0]["table"], "buvette_articles");
    }
}
