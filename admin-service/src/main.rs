//! 数据库管理服务
//!
//! 基于浏览器的 MySQL 管理工具后端，包括：
//! - SQL 执行（参数化查询、书签）
//! - 表搜索与索引管理
//! - 配置存储检查与修复

mod bookmarks;
mod dbi;
mod handlers;
mod import;
mod indexes;
mod list_database;
mod relation;
mod relation_cleanup;
mod renderer;
mod routes;
mod search;
mod sql;
mod state;
mod template;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

pub(crate) const SERVICE_NAME: &str = "admin-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "数据库管理服务 API",
        version = "0.1.0",
        description = "MySQL 管理工具后端"
    ),
    paths(
        handlers::check_relations::check_relations,
        handlers::check_relations::fix_relations,
        handlers::import::import,
        handlers::sql::get_enum_values,
        handlers::sql::get_set_values,
        handlers::table_search::search_form,
        handlers::table_search::do_search,
        handlers::table_search::column_min_max,
        handlers::table_search::data_row,
        handlers::table_indexes::list_indexes,
        handlers::table_indexes::save_index,
        handlers::databases::list_databases,
        handlers::bookmarks::list_bookmarks,
        handlers::bookmarks::delete_bookmark,
        handlers::health::health_check,
    ),
    components(schemas(
        common::models::CheckRelationsRequest,
        common::models::ImportRequest,
        common::models::ColumnValuesRequest,
        common::models::TableSearchRequest,
        common::models::SearchCriterion,
        common::models::SortOrder,
        common::models::ColumnRangeRequest,
        common::models::DataRowRequest,
        common::models::IndexSaveRequest,
        common::models::Index,
        common::models::IndexChoice,
        common::models::IndexColumn,
        common::models::DatabaseListItem,
        common::models::Bookmark,
        handlers::HtmlResponse,
        handlers::SqlResponse,
        handlers::sql::DropdownResponse,
        handlers::table_search::ColumnRangeResponse,
        handlers::table_search::DataRowResponse,
        handlers::databases::DatabaseListResponse,
        handlers::bookmarks::BookmarkDeleted,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "sql", description = "SQL 执行端点"),
        (name = "table", description = "表搜索与索引端点"),
        (name = "database", description = "数据库列表端点"),
        (name = "bookmark", description = "书签端点"),
        (name = "relation", description = "配置存储端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 文件可选
    dotenvy::dotenv().ok();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);
    info!(
        db_host = %config.server.host,
        db_port = config.server.port,
        storage = %config.server.pmadb,
        "配置已加载"
    );

    // 创建应用状态
    let state = AppState::new(config.clone()).context("创建应用状态失败")?;

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
