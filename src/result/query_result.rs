//! Canonical query result

use serde::Serialize;
use serde_json::Value;

use crate::router::Route;

/// Backend-agnostic tabular result
///
/// Every row has exactly `columns.len()` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names in output order
    pub columns: Vec<String>,
    /// Rows aligned with `columns`
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub execution_time_ms: u64,
    /// Reserved; always false
    pub served_from_cache: bool,
    /// Backend route that produced the rows
    pub served_by: Route,
}

impl QueryResult {
    /// Returns true if no rows matched
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Returns true if every row has one value per column
    pub fn is_aligned(&self) -> bool {
        self.rows.iter().all(|r| r.len() == self.columns.len())
    }
}
