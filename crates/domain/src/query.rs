//! Positional statement parameters and normalized results.

use serde::{Deserialize, Serialize};

/// A positional statement parameter, bound by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Rows returned by a statement, normalized to JSON values.
///
/// `rows[i][j]` is the value of `columns[j]` in row `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a cell by row index and column name.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&serde_json::Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Rows as `column -> value` objects.
    #[must_use]
    pub fn to_objects(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}

/// A named statement offered to console users as a starting point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleQuery {
    pub name: &'static str,
    pub statement: &'static str,
}

/// Starter statements for the raw query console.
pub const EXAMPLE_QUERIES: &[ExampleQuery] = &[
    ExampleQuery {
        name: "All Patients",
        statement: "SELECT * FROM patients LIMIT 10",
    },
    ExampleQuery {
        name: "Male Patients",
        statement: "SELECT * FROM patients WHERE gender = 'Male'",
    },
    ExampleQuery {
        name: "Female Patients",
        statement: "SELECT * FROM patients WHERE gender = 'Female'",
    },
    ExampleQuery {
        name: "Patients by Age",
        statement: "SELECT first_name, last_name, date_of_birth, \
            (strftime('%Y', 'now') - strftime('%Y', date_of_birth)) \
            - (strftime('%m-%d', 'now') < strftime('%m-%d', date_of_birth)) AS age \
            FROM patients ORDER BY age DESC",
    },
];
