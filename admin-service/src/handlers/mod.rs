//! HTTP 处理器
//!
//! One module per feature. Handlers validate input, call the matching
//! service and hand the output to [`crate::renderer::ResponseRenderer`].

pub mod bookmarks;
pub mod check_relations;
pub mod databases;
pub mod health;
pub mod import;
pub mod sql;
pub mod table_indexes;
pub mod table_search;

use serde::Serialize;
use utoipa::ToSchema;

/// HTML fragment returned to AJAX callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct HtmlResponse {
    pub message: String,
}

/// Rendered statement result.
#[derive(Debug, Serialize, ToSchema)]
pub struct SqlResponse {
    /// Result page as HTML.
    pub message: String,
    /// Statement as executed, including any page `LIMIT`.
    pub sql_query: String,
}
