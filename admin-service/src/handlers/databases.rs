use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppResult;
use common::models::{DatabaseListItem, ListDatabasesQuery};
use common::response::ApiResponse;

use crate::list_database::ListDatabase;
use crate::renderer::ResponseRenderer;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseListResponse {
    pub databases: Vec<DatabaseListItem>,
    /// Database the page should open with; empty for none.
    pub default: String,
}

/// 数据库列表
#[utoipa::path(
    get,
    path = "/databases",
    tag = "database",
    params(
        ("db" = Option<String>, Query, description = "当前选中的数据库")
    ),
    responses(
        (status = 200, description = "可见数据库", body = ApiResponse<DatabaseListResponse>)
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Query(query): Query<ListDatabasesQuery>,
) -> AppResult<Response> {
    let list = ListDatabase::load(state.dbi.as_ref(), &state.config.server).await?;
    let current = query.db.unwrap_or_default();
    Ok(renderer.json(DatabaseListResponse {
        databases: list.get_list(&current),
        default: list.get_default(&current),
    }))
}
