//! Database listing models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters for listing databases.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListDatabasesQuery {
    /// Currently selected database, marked in the result.
    #[serde(default)]
    pub db: Option<String>,
}

/// One entry of the database list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseListItem {
    pub name: String,
    pub is_selected: bool,
}
