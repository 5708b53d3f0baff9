//! SQL 导入（执行）服务
//!
//! Takes the text of the SQL box or a stored bookmark, substitutes
//! parameters, runs every statement and renders the last result.

use common::errors::{AppError, AppResult};
use common::models::{ImportRequest, NewBookmark};
use common::utils::sql_lexer::{split_statements, substitute_parameters};

use crate::bookmarks::BookmarkRepository;
use crate::sql::{ExecutedQuery, QueryParams, Sql};
use crate::state::AppState;

pub struct Import {
    sql: Sql,
    bookmarks: BookmarkRepository,
    user: String,
}

impl Import {
    pub fn new(state: &AppState) -> Self {
        Self {
            sql: Sql::new(state),
            bookmarks: state.bookmarks(),
            user: state.config.server.user.clone(),
        }
    }

    /// 执行导入请求
    pub async fn run(&self, req: &ImportRequest) -> AppResult<ExecutedQuery> {
        let query = match req.id_bookmark {
            Some(id) => self.bookmarks.get(id).await?.query,
            None => req.sql_query.clone(),
        };
        if query.trim().is_empty() {
            return Err(AppError::Validation("No SQL query was given".into()));
        }

        if let Some(label) = req.bookmark_label.as_deref().filter(|l| !l.trim().is_empty()) {
            self.save_bookmark(req, label, &query).await?;
        }

        let substituted = if req.parameterized {
            substitute_parameters(&query, &req.parameters)
        } else {
            query
        };

        let statements = split_statements(&substituted);
        let Some((last, leading)) = statements.split_last() else {
            return Err(AppError::Validation("No SQL query was given".into()));
        };

        // Later statements of a script depend on the session state of earlier ones.
        let mut session = self.sql.open_session(&req.db).await?;
        for statement in leading {
            self.sql
                .execute_statement(session.as_mut(), &req.db, statement)
                .await?;
        }
        tracing::info!(db = %req.db, statements = statements.len(), "import executed");

        let prefix_message = (statements.len() > 1).then(|| {
            format!(
                "Import has been successfully finished, {} queries executed.",
                statements.len()
            )
        });
        self.sql
            .execute_query_and_get_result(
                session.as_mut(),
                QueryParams {
                    db: &req.db,
                    table: &req.table,
                    sql: last,
                    display_sql: Some(substituted.trim()),
                    pos: req.pos,
                    prefix_message,
                },
            )
            .await
    }

    /// Stores the query as written, before parameter substitution.
    async fn save_bookmark(&self, req: &ImportRequest, label: &str, query: &str) -> AppResult<()> {
        let bookmark = NewBookmark {
            database: req.db.clone(),
            user: if req.bookmark_all_users {
                String::new()
            } else {
                self.user.clone()
            },
            label: label.to_string(),
            query: query.to_string(),
        };
        match self.bookmarks.save(&bookmark).await {
            Err(AppError::StorageUnavailable(reason)) => {
                tracing::warn!(%reason, "bookmark not saved");
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use serde_json::json;

    use crate::dbi::dummy::DbiDummy;
    use crate::test_support::{state_with, state_with_storage};

    const PARAMETERIZED: &str = "SELECT A.*\nFROM table1 A\nWHERE A.nomEtablissement = :nomEta AND foo = :1 AND `:a` IS NULL";

    #[tokio::test]
    async fn test_parameterized_query() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_select_db("pma_test");
        dbi.add_result(
            "SELECT A.* FROM table1 A WHERE A.nomEtablissement = 'Saint-Louis - Châteaulin' AND foo = 4 AND `:a` IS NULL LIMIT 0, 25",
            &["nomEtablissement", "foo"],
            vec![],
        );
        dbi.add_result(
            "SHOW FULL COLUMNS FROM `pma_test`.`table1`",
            &["Field", "Type", "Collation", "Null", "Key", "Default", "Extra", "Privileges", "Comment"],
            vec![],
        );
        let state = state_with(dbi.clone());

        let req = ImportRequest {
            db: "pma_test".into(),
            table: "table1".into(),
            sql_query: PARAMETERIZED.into(),
            parameterized: true,
            parameters: BTreeMap::from([
                (":nomEta".to_string(), "Saint-Louis - Châteaulin".to_string()),
                (":1".to_string(), "4".to_string()),
            ]),
            ..Default::default()
        };
        let executed = Import::new(&state).run(&req).await.unwrap();

        assert!(executed
            .message
            .starts_with("MySQL returned an empty result set (i.e. zero rows)."));
        assert!(executed.html.contains(
            "SELECT A.*\nFROM table1 A\nWHERE A.nomEtablissement = 'Saint-Louis - Châteaulin' AND foo = 4 AND `:a` IS NULL"
        ));
        dbi.assert_all_queries_consumed();
        dbi.assert_all_selects_consumed();
    }

    #[tokio::test]
    async fn test_multiple_statements() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_affected("INSERT INTO t VALUES (1)", 1);
        dbi.add_affected("UPDATE t SET a = 2", 1);
        let state = state_with(dbi.clone());

        let req = ImportRequest {
            db: "db".into(),
            sql_query: "INSERT INTO t VALUES (1);\n-- bump\nUPDATE t SET a = 2;".into(),
            ..Default::default()
        };
        let executed = Import::new(&state).run(&req).await.unwrap();
        assert_eq!(
            executed.message,
            "Import has been successfully finished, 2 queries executed. 1 row affected."
        );
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_script_runs_in_one_session() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_select_db("db");
        dbi.add_affected("START TRANSACTION", 0);
        dbi.add_affected("SET @total = 2", 0);
        dbi.add_affected("COMMIT", 0);
        dbi.add_result("SELECT @total LIMIT 0, 25", &["@total"], vec![vec![json!(2)]]);
        let state = state_with(dbi.clone());

        let req = ImportRequest {
            db: "db".into(),
            sql_query: "START TRANSACTION;\nSET @total = 2;\nCOMMIT;\nSELECT @total;".into(),
            ..Default::default()
        };
        let executed = Import::new(&state).run(&req).await.unwrap();
        assert_eq!(executed.result.rows, vec![vec![json!(2)]]);

        let statements = dbi.executed_in_sessions();
        assert_eq!(statements.len(), 4);
        assert!(statements
            .iter()
            .all(|e| e.session == statements[0].session && e.database.as_deref() == Some("db")));
        dbi.assert_all_queries_consumed();
        dbi.assert_all_selects_consumed();
    }

    #[tokio::test]
    async fn test_without_database_selects_none() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_result("SELECT 1 LIMIT 0, 25", &["1"], vec![vec![json!(1)]]);
        dbi.add_affected("DROP TABLE users", 0);
        let state = state_with(dbi.clone());

        for (db, sql) in [("prod", "SELECT 1"), ("", "DROP TABLE users")] {
            let req = ImportRequest {
                db: db.into(),
                sql_query: sql.into(),
                ..Default::default()
            };
            Import::new(&state).run(&req).await.unwrap();
        }

        let statements = dbi.executed_in_sessions();
        assert_eq!(statements[0].database.as_deref(), Some("prod"));
        assert_eq!(statements[1].sql, "DROP TABLE users");
        assert_eq!(statements[1].database, None);
        assert_ne!(statements[0].session, statements[1].session);
    }

    #[tokio::test]
    async fn test_dropped_table_is_removed_from_storage() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_affected("DROP TABLE `orders`", 0);
        let state = state_with_storage(dbi.clone(), &["dbadmin__relation"]);
        dbi.add_affected(
            "DELETE FROM `dbadmin`.`dbadmin__relation` WHERE master_db = 'shop' AND master_table = 'orders'",
            1,
        );
        dbi.add_affected(
            "DELETE FROM `dbadmin`.`dbadmin__relation` WHERE foreign_db = 'shop' AND foreign_table = 'orders'",
            2,
        );
        dbi.add_result("SELECT 1 LIMIT 0, 25", &["1"], vec![vec![json!(1)]]);

        let req = ImportRequest {
            db: "shop".into(),
            sql_query: "DROP TABLE `orders`; SELECT 1".into(),
            ..Default::default()
        };
        Import::new(&state).run(&req).await.unwrap();
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_runs_bookmark_and_saves_new_one() {
        let dbi = Arc::new(DbiDummy::new());
        dbi.add_result(
            "SELECT `id`, `dbase`, `user`, `label`, `query` FROM `dbadmin`.`dbadmin__bookmark` WHERE `id` = 5 AND (`user` = '' OR `user` = 'root')",
            &["id", "dbase", "user", "label", "query"],
            vec![vec![json!(5), json!("db"), json!("root"), json!("all"), json!("SELECT * FROM t")]],
        );
        dbi.add_affected(
            "INSERT INTO `dbadmin`.`dbadmin__bookmark` (`dbase`, `user`, `query`, `label`) VALUES ('db', 'root', 'SELECT * FROM t', 'copy')",
            1,
        );
        dbi.add_result("SELECT * FROM t LIMIT 0, 25", &["a"], vec![vec![json!(1)]]);
        let state = state_with_storage(dbi.clone(), &["dbadmin__bookmark"]);

        let req = ImportRequest {
            db: "db".into(),
            id_bookmark: Some(5),
            bookmark_label: Some("copy".into()),
            ..Default::default()
        };
        let executed = Import::new(&state).run(&req).await.unwrap();
        assert_eq!(executed.result.rows.len(), 1);
        dbi.assert_all_queries_consumed();
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let state = state_with(Arc::new(DbiDummy::new()));
        let req = ImportRequest {
            sql_query: "  -- nothing\n".into(),
            ..Default::default()
        };
        assert!(matches!(
            Import::new(&state).run(&req).await,
            Err(AppError::Validation(_))
        ));
    }
}
