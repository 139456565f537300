//! The ordered migration list
//!
//! Declaration order is execution order. Append only.

use super::{ColumnSet, Migration};

/// Every migration known to this build, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        description: "Create buvette_articles table",
        table: "buvette_articles",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS buvette_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT,
                unit TEXT,
                content_size TEXT,
                comment TEXT,
                stock INTEGER DEFAULT 0
            );
        "#],
        trigger: lacks_buvette_table,
    },
    Migration {
        description: "Add purchase_price to buvette_articles",
        table: "buvette_articles",
        statements: &["ALTER TABLE buvette_articles ADD COLUMN purchase_price REAL"],
        trigger: lacks_purchase_price,
    },
];

fn lacks_buvette_table(columns: &ColumnSet) -> bool {
    columns.is_empty()
}

fn lacks_purchase_price(columns: &ColumnSet) -> bool {
    columns.lacks("purchase_price")
}
