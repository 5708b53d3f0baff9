//! Configuration storage check page.

use axum::{extract::State, response::Response, Json};
use serde_json::json;

use common::errors::{AppError, AppResult};
use common::models::CheckRelationsRequest;
use common::response::ApiResponse;

use crate::handlers::HtmlResponse;
use crate::relation::DEFAULT_STORAGE_DB;
use crate::renderer::ResponseRenderer;
use crate::state::AppState;

const PAGE_TITLE: &str = "Configuration storage";

async fn render_page(
    state: &AppState,
    renderer: &ResponseRenderer,
    message: Option<String>,
) -> AppResult<Response> {
    let params = state.relation.get_relation_parameters().await;
    let body = state.template.render(
        "relation/check_relations.html",
        json!({
            "storage_db": params.db,
            "default_db": DEFAULT_STORAGE_DB,
            "features": params.statuses(),
            "all_ok": params.all_ok(),
            "message": message,
        }),
    )?;
    renderer.html(&state.template, PAGE_TITLE, body)
}

/// 配置存储检查页面
#[utoipa::path(
    get,
    path = "/check-relations",
    tag = "relation",
    responses(
        (status = 200, description = "配置存储状态", body = ApiResponse<HtmlResponse>)
    )
)]
pub async fn check_relations(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
) -> AppResult<Response> {
    render_page(&state, &renderer, None).await
}

/// 创建或修复配置存储
#[utoipa::path(
    post,
    path = "/check-relations",
    tag = "relation",
    request_body = CheckRelationsRequest,
    responses(
        (status = 200, description = "配置存储状态", body = ApiResponse<HtmlResponse>),
        (status = 400, description = "未指定数据库")
    )
)]
pub async fn fix_relations(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<CheckRelationsRequest>,
) -> AppResult<Response> {
    let message = if req.create_pmadb {
        state.relation.fix_storage(DEFAULT_STORAGE_DB, true).await?;
        Some(format!(
            "Configuration storage has been created in '{DEFAULT_STORAGE_DB}'."
        ))
    } else if req.fixall_pmadb || req.fix_pmadb {
        let target = match req.db.filter(|db| req.fix_pmadb && !db.is_empty()) {
            Some(db) => db,
            None => state.relation.storage_db().await.ok_or_else(|| {
                AppError::Validation("No configuration storage database is configured".into())
            })?,
        };
        state.relation.fix_storage(&target, false).await?;
        Some(format!("Missing configuration storage tables were created in '{target}'."))
    } else {
        None
    };

    render_page(&state, &renderer, message).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::dbi::dummy::DbiDummy;
    use crate::relation::Feature;
    use crate::test_support::{ajax_json, app, get, send_json, send_text, state_with, state_with_storage};

    #[tokio::test]
    async fn test_page_without_storage() {
        let dbi = Arc::new(DbiDummy::new());
        let (status, body) = send_json(
            app(state_with(dbi)),
            ajax_json("GET", "/check-relations?ajax_request=1", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let html = body["data"]["message"].as_str().unwrap();
        assert!(html.contains("Configuration storage"));
        assert!(html.contains(
            "Configuration of pmadb…      <span class=\"text-danger\"><strong>not OK</strong></span>"
        ));
        assert!(html.contains(
            "Create</a> a database named 'dbadmin' and setup the configuration storage there."
        ));
    }

    #[tokio::test]
    async fn test_full_page_for_browser() {
        let dbi = Arc::new(DbiDummy::new());
        let (status, html) = send_text(app(state_with(dbi)), get("/check-relations")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Configuration storage</title>"));
    }

    #[tokio::test]
    async fn test_partial_storage_lists_features() {
        let dbi = Arc::new(DbiDummy::new());
        let state = state_with_storage(dbi, &["dbadmin__bookmark"]);
        let (_, body) = send_json(
            app(state),
            ajax_json("GET", "/check-relations", json!({})),
        )
        .await;
        let html = body["data"]["message"].as_str().unwrap();
        assert!(html.contains("Bookmarked SQL query"));
        assert!(html.contains("data-action=\"fixall_pmadb\""));
    }

    #[tokio::test]
    async fn test_create_storage() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_affected(
            "CREATE DATABASE IF NOT EXISTS `dbadmin` DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_bin",
            1,
        );
        dbi.add_result("SHOW TABLES FROM `dbadmin`", &["Tables_in_dbadmin"], vec![]);
        for feature in Feature::ALL {
            dbi.add_affected(&feature.create_table_sql("dbadmin"), 0);
        }
        dbi.add_result(
            "SHOW TABLES FROM `dbadmin`",
            &["Tables_in_dbadmin"],
            Feature::ALL.iter().map(|f| vec![json!(f.table())]).collect(),
        );

        let (status, body) = send_json(
            app(state_with(dbi.clone())),
            ajax_json("POST", "/check-relations", json!({"create_pmadb": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let html = body["data"]["message"].as_str().unwrap();
        assert!(html.contains("Configuration storage has been created in &#039;dbadmin&#039;."));
        assert!(!html.contains("not OK"));
        dbi.assert_all_queries_consumed();
    }
}
