use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use validator::Validate;

use common::errors::AppResult;
use common::models::{IndexSaveRequest, TableQuery};
use common::response::ApiResponse;

use crate::handlers::HtmlResponse;
use crate::indexes::{Indexes, SaveOutcome};
use crate::renderer::ResponseRenderer;
use crate::state::AppState;

/// 表索引列表
#[utoipa::path(
    get,
    path = "/table/indexes",
    tag = "table",
    params(
        ("db" = String, Query, description = "数据库名"),
        ("table" = String, Query, description = "表名")
    ),
    responses(
        (status = 200, description = "索引表", body = ApiResponse<HtmlResponse>)
    )
)]
pub async fn list_indexes(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Query(query): Query<TableQuery>,
) -> AppResult<Response> {
    query.validate()?;
    let body = Indexes::new(&state)
        .index_table(&query.db, &query.table)
        .await?;
    renderer.html(&state.template, "Indexes", body)
}

/// 预览、创建、修改或重命名索引
#[utoipa::path(
    post,
    path = "/table/indexes",
    tag = "table",
    request_body = IndexSaveRequest,
    responses(
        (status = 200, description = "预览 SQL（sql_data）或保存结果（message, index_table）"),
        (status = 400, description = "索引定义无效或执行失败")
    )
)]
pub async fn save_index(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<IndexSaveRequest>,
) -> AppResult<Response> {
    req.validate()?;
    let outcome: SaveOutcome = Indexes::new(&state).do_save_data(&req).await?;
    Ok(renderer.json(outcome))
}
