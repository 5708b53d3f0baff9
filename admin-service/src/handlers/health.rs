use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::SERVICE_NAME;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    /// `up` when the administered server answers a ping.
    pub database: String,
    pub timestamp: DateTime<Utc>,
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.dbi.ping().await {
        Ok(elapsed) => {
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "database ping");
            "up"
        }
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            "down"
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::dbi::dummy::DbiDummy;
    use crate::test_support::{app, get, send_json, state_with};

    #[tokio::test]
    async fn test_health() {
        let app = app(state_with(Arc::new(DbiDummy::new())));
        let (status, body) = send_json(app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "up");
    }
}
