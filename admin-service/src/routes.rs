//! 路由模块

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    bookmarks, check_relations, databases, health, import, sql, table_indexes, table_search,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/check-relations",
            get(check_relations::check_relations).post(check_relations::fix_relations),
        )
        .route("/import", post(import::import))
        .route("/sql/get-enum-values", post(sql::get_enum_values))
        .route("/sql/get-set-values", post(sql::get_set_values))
        .route(
            "/table/search",
            get(table_search::search_form).post(table_search::do_search),
        )
        .route("/table/search/min-max", post(table_search::column_min_max))
        .route("/table/search/row", post(table_search::data_row))
        .route(
            "/table/indexes",
            get(table_indexes::list_indexes).post(table_indexes::save_index),
        )
        .route("/databases", get(databases::list_databases))
        .route("/bookmarks", get(bookmarks::list_bookmarks))
        .route("/bookmarks/{id}", delete(bookmarks::delete_bookmark))
        .route("/api/health", get(health::health_check))
}
