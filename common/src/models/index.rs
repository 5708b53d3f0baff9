//! Index models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Kind of index as chosen in the index editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexChoice {
    Primary,
    Unique,
    #[default]
    Index,
    Fulltext,
    Spatial,
}

impl IndexChoice {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IndexChoice::Primary => "PRIMARY",
            IndexChoice::Unique => "UNIQUE",
            IndexChoice::Index => "INDEX",
            IndexChoice::Fulltext => "FULLTEXT",
            IndexChoice::Spatial => "SPATIAL",
        }
    }
}

impl std::fmt::Display for IndexChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One column of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IndexColumn {
    pub name: String,
    /// Prefix length for partial indexes.
    #[serde(default)]
    pub sub_part: Option<u32>,
    #[serde(default)]
    pub seq_in_index: u32,
    #[serde(default)]
    pub cardinality: Option<u64>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub collation: Option<String>,
}

/// An index on a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Index {
    /// Key name; `PRIMARY` for the primary key.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub choice: IndexChoice,
    /// Storage type (`BTREE`, `HASH`, ...).
    #[serde(default)]
    pub index_type: Option<String>,
    #[serde(default)]
    pub columns: Vec<IndexColumn>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub key_block_size: Option<u32>,
    /// Full-text parser plugin.
    #[serde(default)]
    pub parser: Option<String>,
}

impl Index {
    pub fn is_unique(&self) -> bool {
        matches!(self.choice, IndexChoice::Primary | IndexChoice::Unique)
    }

    /// Index column names with their prefix lengths, used to spot duplicates.
    pub fn signature(&self) -> Vec<(String, Option<u32>)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.sub_part))
            .collect()
    }
}

/// Body of the index save endpoint.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IndexSaveRequest {
    #[validate(length(min = 1, message = "Database is required"))]
    pub db: String,
    #[validate(length(min = 1, message = "Table is required"))]
    pub table: String,
    pub index: Index,
    /// Name of the index being edited, if any.
    #[serde(default)]
    pub old_index: Option<String>,
    /// Only return the generated SQL.
    #[serde(default)]
    pub preview_sql: bool,
    /// Rename `old_index` to `index.name` instead of rebuilding it.
    #[serde(default)]
    pub rename: bool,
}
