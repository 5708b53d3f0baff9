//! Enum and set value dropdowns for the grid editor.

use axum::{extract::State, response::Response, Json};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::ColumnValuesRequest;
use common::response::ApiResponse;
use common::utils::ValueOption;

use crate::renderer::ResponseRenderer;
use crate::sql::Sql;
use crate::state::AppState;

/// Largest visible height of a set dropdown.
const MAX_SET_SIZE: usize = 10;

#[derive(Debug, Serialize, ToSchema)]
pub struct DropdownResponse {
    pub dropdown: String,
}

async fn column_values(state: &AppState, req: &ColumnValuesRequest) -> AppResult<Vec<String>> {
    req.validate()?;
    match Sql::new(state)
        .get_values_for_column(&req.db, &req.table, &req.column)
        .await
    {
        Ok(Some(values)) => Ok(values),
        Ok(None) => {
            tracing::warn!(db = %req.db, table = %req.table, column = %req.column, "column not found");
            Err(AppError::processing())
        }
        Err(e) => {
            tracing::warn!(error = %e, "column lookup failed");
            Err(AppError::processing())
        }
    }
}

/// 获取 ENUM 列的下拉框
#[utoipa::path(
    post,
    path = "/sql/get-enum-values",
    tag = "sql",
    request_body = ColumnValuesRequest,
    responses(
        (status = 200, description = "下拉框 HTML", body = ApiResponse<DropdownResponse>),
        (status = 400, description = "列不存在或查询失败")
    )
)]
pub async fn get_enum_values(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<ColumnValuesRequest>,
) -> AppResult<Response> {
    let values = column_values(&state, &req).await?;
    let dropdown = state.template.render(
        "sql/enum_dropdown.html",
        json!({ "options": ValueOption::for_enum(values, &req.curr_value) }),
    )?;
    Ok(renderer.json(DropdownResponse { dropdown }))
}

/// 获取 SET 列的多选框
#[utoipa::path(
    post,
    path = "/sql/get-set-values",
    tag = "sql",
    request_body = ColumnValuesRequest,
    responses(
        (status = 200, description = "多选框 HTML", body = ApiResponse<DropdownResponse>),
        (status = 400, description = "列不存在或查询失败")
    )
)]
pub async fn get_set_values(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<ColumnValuesRequest>,
) -> AppResult<Response> {
    let values = column_values(&state, &req).await?;
    let size = values.len().min(MAX_SET_SIZE);
    let dropdown = state.template.render(
        "sql/set_dropdown.html",
        json!({
            "size": size,
            "options": ValueOption::for_set(values, &req.curr_value),
        }),
    )?;
    Ok(renderer.json(DropdownResponse { dropdown }))
}
