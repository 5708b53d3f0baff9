use axum::{extract::State, response::Response, Json};
use validator::Validate;

use common::errors::AppResult;
use common::models::ImportRequest;
use common::response::ApiResponse;

use crate::handlers::SqlResponse;
use crate::import::Import;
use crate::renderer::ResponseRenderer;
use crate::state::AppState;

/// 执行 SQL 语句
#[utoipa::path(
    post,
    path = "/import",
    tag = "sql",
    request_body = ImportRequest,
    responses(
        (status = 200, description = "执行结果", body = ApiResponse<SqlResponse>),
        (status = 400, description = "SQL 为空或执行失败"),
        (status = 404, description = "书签不存在")
    )
)]
pub async fn import(
    State(state): State<AppState>,
    renderer: ResponseRenderer,
    Json(req): Json<ImportRequest>,
) -> AppResult<Response> {
    req.validate()?;
    let executed = Import::new(&state).run(&req).await?;

    if renderer.is_ajax() {
        return Ok(renderer.json(SqlResponse {
            message: executed.html,
            sql_query: executed.executed_sql,
        }));
    }
    renderer.html(&state.template, "SQL", executed.html)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::dbi::dummy::DbiDummy;
    use crate::test_support::{ajax_json, app, send_json, state_with};

    #[tokio::test]
    async fn test_parameterized_import() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_select_db("pma_test");
        dbi.add_result(
            "SELECT A.* FROM table1 A WHERE A.nomEtablissement = 'Saint-Louis - Châteaulin' AND foo = 4 AND `:a` IS NULL LIMIT 0, 25",
            &["nomEtablissement", "foo"],
            vec![],
        );
        dbi.add_result("SHOW FULL COLUMNS FROM `pma_test`.`table1`", &["Field", "Type"], vec![]);

        let body = json!({
            "db": "pma_test",
            "table": "table1",
            "sql_query": "SELECT A.*\nFROM table1 A\nWHERE A.nomEtablissement = :nomEta AND foo = :1 AND `:a` IS NULL",
            "parameterized": true,
            "parameters": {":nomEta": "Saint-Louis - Châteaulin", ":1": "4"},
        });
        let (status, body) = send_json(app(state_with(dbi.clone())), ajax_json("POST", "/import", body)).await;

        assert_eq!(status, StatusCode::OK);
        let message = body["data"]["message"].as_str().unwrap();
        assert!(message.contains("MySQL returned an empty result set (i.e. zero rows)."));
        assert!(message.contains("SELECT A.*\nFROM table1 A\nWHERE A.nomEtablissement = 'Saint-Louis - Châteaulin' AND foo = 4 AND `:a` IS NULL"));
        assert_eq!(
            body["data"]["sql_query"],
            "SELECT A.* FROM table1 A WHERE A.nomEtablissement = 'Saint-Louis - Châteaulin' AND foo = 4 AND `:a` IS NULL LIMIT 0, 25"
        );
        dbi.assert_all_queries_consumed();
        dbi.assert_all_selects_consumed();
    }

    #[tokio::test]
    async fn test_failing_statement() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_failure("DELETE FROM t");
        let (status, body) = send_json(
            app(state_with(dbi)),
            ajax_json("POST", "/import", json!({"db": "db", "sql_query": "DELETE FROM t"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "QUERY_ERROR");
    }
}
