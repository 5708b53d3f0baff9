//! SQL query models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Body of the import (SQL execution) endpoint.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ImportRequest {
    /// Database the statements run against.
    #[serde(default)]
    pub db: String,

    /// Table the query refers to, used for column metadata.
    #[serde(default)]
    pub table: String,

    /// SQL text, possibly several `;`-separated statements.
    #[serde(default)]
    #[validate(length(max = 1048576, message = "SQL text is too long"))]
    pub sql_query: String,

    /// Whether `parameters` should be substituted into the query.
    #[serde(default)]
    pub parameterized: bool,

    /// Placeholder (`:name`) to value map.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Offset of the first row to show.
    #[serde(default)]
    pub pos: u64,

    /// Save the query as a bookmark with this label.
    #[serde(default)]
    pub bookmark_label: Option<String>,

    /// Share the new bookmark with every user.
    #[serde(default)]
    pub bookmark_all_users: bool,

    /// Run a stored bookmark instead of `sql_query`.
    #[serde(default)]
    pub id_bookmark: Option<u64>,
}

/// Result of a SQL statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column information.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values).
    #[schema(value_type = Vec<Vec<Object>>)]
    pub rows: Vec<Vec<Value>>,

    /// Number of rows returned.
    #[serde(default)]
    pub row_count: usize,

    /// Number of rows affected (for INSERT/UPDATE/DELETE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,

    /// Query execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// Column information in query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the driver.
    pub data_type: String,

    /// Whether the column is nullable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: None,
        }
    }
}

impl QueryResult {
    /// Creates a row-returning result with untyped (`VARCHAR`) columns.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|name| ColumnInfo::new(*name, "VARCHAR"))
                .collect(),
            row_count: rows.len(),
            rows,
            affected_rows: None,
            execution_time_ms: 0,
        }
    }

    /// Creates a query result with affected rows count (for non-SELECT queries).
    pub fn affected(affected: u64, execution_time_ms: u64) -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
            affected_rows: Some(affected),
            execution_time_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Value of `column` in row `row` as text; `None` for SQL NULL.
    pub fn get_str(&self, row: usize, column: &str) -> Option<String> {
        self.get(row, column).and_then(value_to_text)
    }

    /// Row as a column-name keyed object.
    pub fn row_map(&self, row: usize) -> Option<Map<String, Value>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .zip(values)
                .map(|(column, value)| (column.name.clone(), value.clone()))
                .collect(),
        )
    }

    /// Values of the first column.
    pub fn first_column(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first().and_then(value_to_text))
            .collect()
    }
}

/// Text form of a cell; `None` for NULL.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_access() {
        let result = QueryResult::from_rows(
            &["Field", "Type"],
            vec![vec![json!("id"), json!("int(11)")], vec![json!("n"), Value::Null]],
        );
        assert_eq!(result.get_str(0, "Type").as_deref(), Some("int(11)"));
        assert_eq!(result.get_str(1, "Type"), None);
        assert_eq!(result.get_str(0, "Missing"), None);
        assert_eq!(result.first_column(), vec!["id", "n"]);
        assert_eq!(result.row_map(0).unwrap()["Field"], json!("id"));
    }

    #[test]
    fn test_numbers_render_as_text() {
        let result = QueryResult::from_rows(&["n"], vec![vec![json!(4)]]);
        assert_eq!(result.get_str(0, "n").as_deref(), Some("4"));
    }
}
