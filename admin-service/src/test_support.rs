//! Shared fixtures for unit and router tests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::config::{AppConfig, ServerConfig};

use crate::dbi::dummy::DbiDummy;
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-signing-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        service_name: crate::SERVICE_NAME.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections: 1,
        connect_timeout_secs: 1,
        server: ServerConfig {
            signing_secret: TEST_SECRET.to_string(),
            ..Default::default()
        },
    }
}

/// State without configuration storage.
pub fn state_with(dbi: Arc<DbiDummy>) -> AppState {
    AppState::with_dbi(test_config(), dbi).unwrap()
}

/// State whose storage database `dbadmin` holds `tables`.
pub fn state_with_storage(dbi: Arc<DbiDummy>, tables: &[&str]) -> AppState {
    dbi.add_result(
        "SHOW TABLES FROM `dbadmin`",
        &["Tables_in_dbadmin"],
        tables.iter().map(|t| vec![json!(t)]).collect(),
    );
    let mut config = test_config();
    config.server.pmadb = "dbadmin".to_string();
    AppState::with_dbi(config, dbi).unwrap()
}

pub fn app(state: AppState) -> Router {
    crate::create_router(state)
}

/// JSON request marked as AJAX.
pub fn ajax_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-requested-with", "XMLHttpRequest")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Sends `request` and returns the status with the body parsed as JSON.
pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Sends `request` and returns the status with the raw body.
pub async fn send_text(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
