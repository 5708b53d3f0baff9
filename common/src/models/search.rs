//! Table search models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// `db` + `table` query parameters.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TableQuery {
    #[validate(length(min = 1, message = "Database is required"))]
    pub db: String,
    #[validate(length(min = 1, message = "Table is required"))]
    pub table: String,
}

/// Condition on one column.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SearchCriterion {
    pub column: String,
    /// One of the operators offered by the search form, e.g. `LIKE %...%`.
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Body of the search execution endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TableSearchRequest {
    #[validate(length(min = 1, message = "Database is required"))]
    pub db: String,
    #[validate(length(min = 1, message = "Table is required"))]
    pub table: String,
    /// Columns in the select list; empty selects every column.
    #[serde(default)]
    pub columns_to_display: Vec<String>,
    #[serde(default)]
    pub criteria: Vec<SearchCriterion>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub pos: u64,
}

/// Body of the column range endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ColumnRangeRequest {
    #[validate(length(min = 1, message = "Database is required"))]
    pub db: String,
    #[validate(length(min = 1, message = "Table is required"))]
    pub table: String,
    #[validate(length(min = 1, message = "Column is required"))]
    pub column: String,
}

/// Body of the single row endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DataRowRequest {
    #[validate(length(min = 1, message = "Database is required"))]
    pub db: String,
    #[validate(length(min = 1, message = "Table is required"))]
    pub table: String,
    #[validate(length(min = 1, message = "Where clause is required"))]
    pub where_clause: String,
    /// Signature issued together with the where clause.
    pub where_clause_sign: String,
}
