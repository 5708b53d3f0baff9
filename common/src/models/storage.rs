//! Configuration storage models.

use serde::Deserialize;
use utoipa::ToSchema;

/// Actions accepted by the configuration storage check page.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckRelationsRequest {
    /// Create the default storage database and its tables.
    #[serde(default)]
    pub create_pmadb: bool,
    /// Create missing tables in the configured storage database.
    #[serde(default)]
    pub fixall_pmadb: bool,
    /// Create missing tables in the database named by `db`.
    #[serde(default)]
    pub fix_pmadb: bool,
    #[serde(default)]
    pub db: Option<String>,
}
