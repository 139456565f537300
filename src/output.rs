//! Output formatting shared by all commands
//!
//! Every command accepts the same set of formats. JSON variants serialize the
//! command's result struct; table variants render rows through `tabled`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unified output format for all commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON (single line per object)
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines format (one JSON object per line, for streaming)
    JsonLine,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    /// Check if this is a JSON variant
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    /// Get a list of all format names for help text
    pub fn all_names() -> &'static [&'static str] {
        &[
            "table",
            "markdown",
            "json",
            "json-pretty",
            "json-line",
            "psv",
        ]
    }

    /// Serialize `value` according to a JSON variant
    ///
    /// Non-JSON formats fall back to compact JSON.
    pub fn render_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::JsonPretty => serde_json::to_string_pretty(value),
            _ => serde_json::to_string(value),
        }
    }

    /// Serialize a list of items according to a JSON variant
    ///
    /// `json-line` writes one object per line; the other variants write the
    /// list as a single JSON array.
    pub fn render_json_list<T: Serialize>(&self, items: &[T]) -> serde_json::Result<String> {
        match self {
            Self::JsonLine => Ok(items
                .iter()
                .map(serde_json::to_string)
                .collect::<serde_json::Result<Vec<_>>>()?
                .join("\n")),
            _ => self.render_json(&items),
        }
    }

    /// Render rows for the table-like formats (table, markdown, psv)
    #[cfg(feature = "display")]
    pub fn render_rows<T: tabled::Tabled>(&self, rows: &[T]) -> String {
        use tabled::settings::Style;
        use tabled::Table;

        match self {
            Self::Markdown => Table::new(rows).with(Style::markdown()).to_string(),
            Self::Psv => {
                let mut lines = vec![T::headers().join("|")];
                lines.extend(rows.iter().map(|r| r.fields().join("|")));
                lines.join("\n")
            }
            _ => Table::new(rows).with(Style::rounded()).to_string(),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
            Self::Psv => write!(f, "psv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}
