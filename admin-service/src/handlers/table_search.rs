//! Table search: form, execution and helper lookups.

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use validator::Validate;

use common::errors::AppResult;
use common::models::{ColumnRangeRequest, DataRowRequest, TableQuery, TableSearchRequest};
use common::response::ApiResponse;

use crate::handlers::{HtmlResponse, SqlResponse};
use crate::renderer::ResponseRenderer;
use crate::search::Search;
use crate::sql::QueryParams;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ColumnRangeResponse {
    /// `min` and `max` of the column.
    #[schema(value_type = Object)]
    pub column_data: Map<String, Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DataRowResponse {
    #[schema(value_type = Object)]
    pub row_info: Map<String, Value>,
}

/// 表搜索表单
#[utoipa::path(
    get,
    path = "/table/search",
    tag = "table",
    params(
        ("db" = String, Query, description = "数据库名"),
        ("table" = String, Query, description = "表名")
    ),
    responses(
        (status = 200, description = "搜索表单", body = ApiResponse<HtmlResponse>)
    )
)]
pub async fn search_form(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Query(query): Query<TableQuery>,
) -> AppResult<Response> {
    query.validate()?;
    let columns = Search::new(&state)
        .form_columns(&query.db, &query.table)
        .await?;
    let body = state.template.render(
        "table/search_form.html",
        json!({ "db": query.db, "table": query.table, "columns": columns }),
    )?;
    renderer.html(&state.template, "Search", body)
}

/// 执行表搜索
#[utoipa::path(
    post,
    path = "/table/search",
    tag = "table",
    request_body = TableSearchRequest,
    responses(
        (status = 200, description = "搜索结果", body = ApiResponse<SqlResponse>),
        (status = 400, description = "条件无效")
    )
)]
pub async fn do_search(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<TableSearchRequest>,
) -> AppResult<Response> {
    req.validate()?;
    let search = Search::new(&state);
    let columns = state.dbi.get_columns(&req.db, &req.table).await?;
    let sql = search.build_sql_query(&req, &columns)?;
    tracing::debug!(db = %req.db, table = %req.table, %sql, "table search");

    let mut session = search.sql().open_session(&req.db).await?;
    let executed = search
        .sql()
        .execute_query_and_get_result(
            session.as_mut(),
            QueryParams {
                db: &req.db,
                table: &req.table,
                sql: &sql,
                display_sql: None,
                pos: req.pos,
                prefix_message: None,
            },
        )
        .await?;

    if renderer.is_ajax() {
        return Ok(renderer.json(SqlResponse {
            message: executed.html,
            sql_query: executed.executed_sql,
        }));
    }
    renderer.html(&state.template, "Search", executed.html)
}

/// 获取列的取值范围
#[utoipa::path(
    post,
    path = "/table/search/min-max",
    tag = "table",
    request_body = ColumnRangeRequest,
    responses(
        (status = 200, description = "最小值与最大值", body = ApiResponse<ColumnRangeResponse>)
    )
)]
pub async fn column_min_max(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<ColumnRangeRequest>,
) -> AppResult<Response> {
    req.validate()?;
    let column_data = Search::new(&state)
        .get_column_min_max(&req.db, &req.table, &req.column)
        .await?;
    Ok(renderer.json(ColumnRangeResponse { column_data }))
}

/// 按签名条件获取单行
#[utoipa::path(
    post,
    path = "/table/search/row",
    tag = "table",
    request_body = DataRowRequest,
    responses(
        (status = 200, description = "行数据", body = ApiResponse<DataRowResponse>),
        (status = 400, description = "签名无效")
    )
)]
pub async fn data_row(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<DataRowRequest>,
) -> AppResult<Response> {
    req.validate()?;
    let row_info = Search::new(&state).get_data_row(&req).await?;
    Ok(renderer.json(DataRowResponse { row_info }))
}
