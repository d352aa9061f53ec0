//! Export flattening
//!
//! Converts an arbitrary nested record into a flat ordered sequence of
//! (Field, Value) rows for a row-oriented table. Traversal is depth-first in
//! insertion order, so repeated export of an unchanged record is
//! byte-identical. Encoding the rows into a concrete spreadsheet format is
//! the caller's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of tabular output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    /// Path to the leaf: `.key` segments for mappings, `[i]` for lists
    #[serde(rename = "Field")]
    pub field: String,
    /// The leaf value, unchanged
    #[serde(rename = "Value")]
    pub value: Value,
}

/// Flatten one record (any JSON value) into rows.
///
/// Scalar leaves (strings, numbers, booleans, null) emit one row each; empty
/// mappings and lists emit nothing. A bare scalar at the root emits a single
/// row with an empty path.
pub fn flatten(value: &Value) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    walk(value, String::new(), &mut rows);
    rows
}

/// Flatten a sequence of records, concatenating each record's rows in
/// sequence order.
pub fn flatten_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Vec<FlatRow> {
    values.into_iter().flat_map(flatten).collect()
}

fn walk(value: &Value, path: String, rows: &mut Vec<FlatRow>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let next = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, next, rows);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{path}[{i}]"), rows);
            }
        }
        leaf => rows.push(FlatRow {
            field: path,
            value: leaf.clone(),
        }),
    }
}
