use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::errors::AppResult;
use common::models::Bookmark;
use common::response::ApiResponse;

use crate::renderer::ResponseRenderer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookmarkListQuery {
    #[serde(default)]
    pub db: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookmarkDeleted {
    pub id: u64,
}

/// 列出书签
#[utoipa::path(
    get,
    path = "/bookmarks",
    tag = "bookmark",
    params(
        ("db" = String, Query, description = "数据库名")
    ),
    responses(
        (status = 200, description = "书签列表", body = ApiResponse<Vec<Bookmark>>)
    )
)]
pub async fn list_bookmarks(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Query(query): Query<BookmarkListQuery>,
) -> AppResult<Response> {
    let bookmarks = state.bookmarks().list(&query.db).await?;
    Ok(renderer.json(bookmarks))
}

/// 删除书签
#[utoipa::path(
    delete,
    path = "/bookmarks/{id}",
    tag = "bookmark",
    params(
        ("id" = u64, Path, description = "书签 ID")
    ),
    responses(
        (status = 200, description = "已删除", body = ApiResponse<BookmarkDeleted>),
        (status = 404, description = "书签不存在"),
        (status = 409, description = "配置存储不可用")
    )
)]
pub async fn delete_bookmark(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    state.bookmarks().delete(id).await?;
    tracing::info!(id, "bookmark deleted");
    Ok(renderer.json(BookmarkDeleted { id }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    use crate::dbi::dummy::DbiDummy;
    use crate::test_support::{app, get, send_json, state_with, state_with_storage};

    #[tokio::test]
    async fn test_list_without_storage_is_empty() {
        let (status, body) = send_json(app(state_with(Arc::new(DbiDummy::new()))), get("/bookmarks?db=shop")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_bookmark() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_affected(
            "DELETE FROM `dbadmin`.`dbadmin__bookmark` WHERE `id` = 4 AND (`user` = '' OR `user` = 'root')",
            1,
        );
        let state = state_with_storage(dbi.clone(), &["dbadmin__bookmark"]);
        let request = Request::builder()
            .method("DELETE")
            .uri("/bookmarks/4")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(app(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], 4);
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_delete_without_storage() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/bookmarks/4")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(app(state_with(Arc::new(DbiDummy::new()))), request).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "STORAGE_UNAVAILABLE");
    }
}
