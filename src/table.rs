//! Row-oriented table passed between pipeline steps and stored as a result.

use crate::value::{Row, Scalar};

/// An ordered set of column names plus the rows that carry them.
///
/// Rows are maps, so a row may lack a column listed in `columns`; readers
/// treat such cells as [`Scalar::Missing`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names in display order.
    pub columns: Vec<String>,
    /// Records, in sequence order.
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Table { columns, rows }
    }

    /// Build a table from rows, taking column order from first appearance.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            let mut fresh: Vec<&String> = row.keys().filter(|k| !columns.contains(*k)).collect();
            fresh.sort();
            columns.extend(fresh.into_iter().cloned());
        }
        Table { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell value, `Missing` when the row or column is absent.
    pub fn get(&self, row: usize, column: &str) -> Scalar {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .cloned()
            .unwrap_or(Scalar::Missing)
    }

    /// Register a column name if it is not already present.
    pub fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }
}
