//! Column metadata models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// One row of `SHOW FULL COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ColumnFull {
    pub field: String,
    /// Declared type, e.g. `varchar(255)` or `enum('a','b')`.
    #[serde(rename = "type")]
    pub column_type: String,
    pub collation: Option<String>,
    pub is_nullable: bool,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
    pub privileges: String,
    pub comment: String,
}

impl ColumnFull {
    /// Creates a column with only name and type set.
    pub fn new(field: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column_type: column_type.into(),
            collation: None,
            is_nullable: false,
            key: String::new(),
            default: None,
            extra: String::new(),
            privileges: String::new(),
            comment: String::new(),
        }
    }

    /// Lower-cased base type without length or value list (`enum`, `int`, ...).
    pub fn base_type(&self) -> String {
        let end = self
            .column_type
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(self.column_type.len());
        self.column_type[..end].to_ascii_lowercase()
    }
}

/// Body of the enum/set value endpoints.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ColumnValuesRequest {
    #[validate(length(min = 1, message = "Database is required"))]
    pub db: String,
    #[validate(length(min = 1, message = "Table is required"))]
    pub table: String,
    #[validate(length(min = 1, message = "Column is required"))]
    pub column: String,
    /// Value currently stored in the cell being edited.
    #[serde(default)]
    pub curr_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type() {
        assert_eq!(ColumnFull::new("a", "enum('x','y')").base_type(), "enum");
        assert_eq!(ColumnFull::new("a", "INT(11) unsigned").base_type(), "int");
        assert_eq!(ColumnFull::new("a", "text").base_type(), "text");
    }
}
