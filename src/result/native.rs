//! Native backend result shapes

use serde_json::{Map, Value};

/// Rows as a backend hands them back, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum NativeResult {
    /// Column list plus rows of positional values (embedded engine)
    Positional {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// Rows of named fields (relational store)
    Named(Vec<Map<String, Value>>),
}

impl NativeResult {
    pub fn positional(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        NativeResult::Positional { columns, rows }
    }

    pub fn named(rows: Vec<Map<String, Value>>) -> Self {
        NativeResult::Named(rows)
    }

    /// Number of rows returned
    pub fn row_count(&self) -> usize {
        match self {
            NativeResult::Positional { rows, .. } => rows.len(),
            NativeResult::Named(rows) => rows.len(),
        }
    }
}
