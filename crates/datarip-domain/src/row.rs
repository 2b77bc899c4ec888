//! Rows and tables - the tabular input boundary

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One table row: column name to value
///
/// Keys are unique. A row is never mutated once it enters a job; merging an
/// extraction result produces a new row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, Value>);

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used mostly by tests and adapters
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Value stored under `column`
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Whether the row has a value for `column`
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over (column, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text rendering of a cell, as sent to the extraction service
    ///
    /// Strings are passed through, `null` and missing cells become empty text,
    /// and any other value uses its JSON rendering.
    pub fn text(&self, column: &str) -> String {
        match self.0.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Copy of this row with `extracted` overlaid
    ///
    /// On a key collision the extracted value wins. Existing columns keep
    /// their position; new keys are appended in the order given.
    pub fn merged_with(&self, extracted: &Map<String, Value>) -> Row {
        let mut merged = self.0.clone();
        for (key, value) in extracted {
            merged.insert(key.clone(), value.clone());
        }
        Row(merged)
    }

    /// Copy of this row restricted to `columns`, in that order
    pub fn project(&self, columns: &[String]) -> Row {
        Row(columns
            .iter()
            .filter_map(|c| self.0.get(c).map(|v| (c.clone(), v.clone())))
            .collect())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row(iter.into_iter().collect())
    }
}

/// An input table: ordered column names and the rows under them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Column names in display order
    pub columns: Vec<String>,

    /// Rows in input order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a table
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Whether `column` is one of the table's columns
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of the table restricted to `columns`
    ///
    /// Unknown column names are dropped from the projection.
    pub fn project(&self, columns: &[String]) -> Table {
        let kept: Vec<String> = columns
            .iter()
            .filter(|c| self.has_column(c))
            .cloned()
            .collect();
        let rows = self.rows.iter().map(|r| r.project(&kept)).collect();
        Table::new(kept, rows)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: extracted values always win on collision, other keys survive
        #[test]
        fn test_merge_precedence(
            original in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5),
            extracted in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5),
        ) {
            let row: Row = original
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();
            let result: Map<String, Value> = extracted
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();

            let merged = row.merged_with(&result);

            for (k, v) in &extracted {
                prop_assert_eq!(merged.get(k), Some(&Value::from(*v)));
            }
            for (k, v) in &original {
                if !extracted.contains_key(k) {
                    prop_assert_eq!(merged.get(k), Some(&Value::from(*v)));
                }
            }
        }
    }
}
