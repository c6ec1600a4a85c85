//! Notebook content: text notes, tables and figure references

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tabular data with a fixed column list.
///
/// Cells are JSON values; `null` marks a missing value and renders
/// empty. Rendering beyond the plain-text [`fmt::Display`] form is the
/// consumer's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    /// Column names, in display order.
    pub columns: Vec<String>,
    /// One cell vector per row, aligned with `columns`.
    pub rows: Vec<Vec<Value>>,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(String::len).collect();
        for row in &self.rows {
            for (i, value) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell_text(value).len());
                }
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| format!("{col:<w$}"))
            .collect();
        writeln!(f, " {}", header.join(" | "))?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write!(f, "-{}-", rule.join("-+-"))?;

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(value, &w)| format!("{:<w$}", cell_text(value)))
                .collect();
            write!(f, "\n {}", cells.join(" | "))?;
        }
        Ok(())
    }
}

/// A single piece of experiment notebook content.
///
/// The discriminant is explicit (`"type"` tag); consumers match
/// exhaustively instead of inspecting payloads at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Note {
    /// Free-form prose.
    Text {
        /// The note body.
        text: String,
    },
    /// Tabular data, typically a run comparison.
    Table(Table),
    /// Reference to a stored figure object; decoding is out of scope.
    Figure {
        /// Storage object path of the figure.
        path: String,
    },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => f.write_str(text),
            Self::Table(table) => table.fmt(f),
            Self::Figure { path } => write!(f, "[figure: {path}]"),
        }
    }
}
