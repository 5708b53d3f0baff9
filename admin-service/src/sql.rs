//! SQL 执行与结果渲染
//!
//! Runs statements against the selected database, pages row-returning
//! selects, builds the result message and renders the result table.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use common::errors::{AppError, AppResult};
use common::models::{ColumnFull, ColumnInfo, QueryResult};
use common::response::Pagination;
use common::utils::{
    backquote, escape_mysql_wildcards, parse_enum_set_values, quote_string,
    DropTarget, QuerySigner, SqlAnalyzer,
};
use common::utils::sql_lexer::normalize;
use common::models::query::value_to_text;

use crate::dbi::{DatabaseInterface, DbSession};
use crate::relation::Relation;
use crate::relation_cleanup::RelationCleanup;
use crate::state::AppState;
use crate::template::Template;

pub const EMPTY_RESULT_MESSAGE: &str = "MySQL returned an empty result set (i.e. zero rows).";

/// A statement that was run and rendered.
#[derive(Debug)]
pub struct ExecutedQuery {
    /// Statement as sent to the server, including any page `LIMIT`.
    pub executed_sql: String,
    pub result: QueryResult,
    pub message: String,
    pub pagination: Option<Pagination>,
    pub html: String,
}

/// What to run and how to present it.
#[derive(Debug, Default)]
pub struct QueryParams<'a> {
    pub db: &'a str,
    /// Table whose metadata decorates the result, if any.
    pub table: &'a str,
    /// Statement to execute.
    pub sql: &'a str,
    /// Text shown to the user; defaults to `sql`.
    pub display_sql: Option<&'a str>,
    pub pos: u64,
    /// Message placed before the result message.
    pub prefix_message: Option<String>,
}

#[derive(Serialize)]
struct RenderedRow {
    cells: Vec<Option<String>>,
    where_clause: Option<String>,
    sign: Option<String>,
}

pub struct Sql {
    dbi: Arc<dyn DatabaseInterface>,
    relation: Arc<Relation>,
    template: Arc<Template>,
    signer: QuerySigner,
    max_rows: u32,
}

impl Sql {
    pub fn new(state: &AppState) -> Self {
        Self {
            dbi: state.dbi.clone(),
            relation: state.relation.clone(),
            template: state.template.clone(),
            signer: QuerySigner::new(&state.config.server.signing_secret),
            max_rows: state.config.server.max_rows,
        }
    }

    /// Values of an enum or set column, `None` when the column does not exist.
    pub async fn get_values_for_column(
        &self,
        db: &str,
        table: &str,
        column: &str,
    ) -> AppResult<Option<Vec<String>>> {
        let sql = format!(
            "SHOW COLUMNS FROM {}.{} LIKE {}",
            backquote(db),
            backquote(table),
            quote_string(&escape_mysql_wildcards(column))
        );
        let row = self.dbi.fetch_single_row(None, &sql).await?;
        Ok(row.map(|row| {
            row.get("Type")
                .and_then(value_to_text)
                .map(|definition| parse_enum_set_values(&definition))
                .unwrap_or_default()
        }))
    }

    /// Execution form of `sql` with the page `LIMIT` appended when applicable.
    pub fn limited_query(&self, sql: &str, pos: u64) -> String {
        let normalized = normalize(sql);
        if SqlAnalyzer::can_paginate(&normalized) {
            format!("{normalized} LIMIT {pos}, {}", self.max_rows)
        } else {
            normalized
        }
    }

    /// Opens the session statements for `db` run in; no database is selected
    /// when `db` is empty.
    pub async fn open_session(&self, db: &str) -> AppResult<Box<dyn DbSession>> {
        self.dbi.session(non_empty(db)).await
    }

    /// Runs one statement without rendering, cleaning up after drops.
    pub async fn execute_statement(
        &self,
        session: &mut dyn DbSession,
        db: &str,
        sql: &str,
    ) -> AppResult<QueryResult> {
        let normalized = normalize(sql);
        let result = session.query(&normalized).await?;
        self.cleanup_after_drop(db, &normalized).await;
        Ok(result)
    }

    /// Runs a statement and renders its result.
    pub async fn execute_query_and_get_result(
        &self,
        session: &mut dyn DbSession,
        params: QueryParams<'_>,
    ) -> AppResult<ExecutedQuery> {
        let normalized = normalize(params.sql);
        let paginate = SqlAnalyzer::can_paginate(&normalized);
        let executed_sql = self.limited_query(params.sql, params.pos);

        let result = session.query(&executed_sql).await?;
        self.cleanup_after_drop(params.db, &normalized).await;

        let table_columns = if params.table.is_empty() || params.db.is_empty() {
            Vec::new()
        } else {
            match self.dbi.get_columns(params.db, params.table).await {
                Ok(columns) => columns,
                Err(e) => {
                    tracing::warn!(db = params.db, table = params.table, error = %e, "column metadata unavailable");
                    Vec::new()
                }
            }
        };

        let pagination = if paginate {
            let total = self.count_rows(session, &normalized, params.pos, &result).await;
            Some(Pagination::new(params.pos, self.max_rows, total))
        } else {
            None
        };

        let mut message = result_message(&result, &normalized, pagination.as_ref());
        if let Some(prefix) = params.prefix_message {
            message = format!("{prefix} {message}");
        }

        let rows = self.render_rows(params.db, params.table, &result, &table_columns);
        let html = self.template.render(
            "sql/query_results.html",
            json!({
                "kind": "success",
                "message": message,
                "sql": params.display_sql.unwrap_or(params.sql).trim(),
                "db": params.db,
                "table": params.table,
                "columns": result.columns,
                "rows": rows,
                "pagination": pagination,
            }),
        )?;

        Ok(ExecutedQuery {
            executed_sql,
            result,
            message,
            pagination,
            html,
        })
    }

    /// Total rows matched by a paged select; counted only when the page is full
    /// or not the first one.
    async fn count_rows(
        &self,
        session: &mut dyn DbSession,
        normalized: &str,
        pos: u64,
        page: &QueryResult,
    ) -> u64 {
        let shown = pos + page.rows.len() as u64;
        if pos == 0 && (page.rows.len() as u64) < u64::from(self.max_rows) {
            return shown;
        }

        let sql = format!("SELECT COUNT(*) FROM ({normalized}) AS `count_query`");
        match session.query(&sql).await {
            Ok(count) => count
                .first_column()
                .first()
                .and_then(|c| c.parse().ok())
                .unwrap_or(shown),
            Err(e) => {
                tracing::warn!(error = %e, "row count failed");
                shown
            }
        }
    }

    /// Removes storage rows for every object the statement dropped. Targets
    /// without a database belong to `db`.
    async fn cleanup_after_drop(&self, db: &str, sql: &str) {
        let targets = SqlAnalyzer::drop_targets(sql);
        if targets.is_empty() {
            return;
        }
        let cleanup = RelationCleanup::new(self.dbi.clone(), self.relation.clone());
        for target in &targets {
            let outcome = match target {
                DropTarget::Database(name) => cleanup.database(name).await,
                DropTarget::Table { database, table } => {
                    cleanup.table(database.as_deref().unwrap_or(db), table).await
                }
                DropTarget::Column {
                    database,
                    table,
                    column,
                } => {
                    cleanup
                        .column(database.as_deref().unwrap_or(db), table, column)
                        .await
                }
            };
            if let Err(e) = outcome {
                tracing::warn!(?target, error = %e, "configuration storage cleanup failed");
            }
        }
    }

    fn render_rows(
        &self,
        db: &str,
        table: &str,
        result: &QueryResult,
        table_columns: &[ColumnFull],
    ) -> Vec<RenderedRow> {
        let key_columns = unique_key_columns(&result.columns, table_columns);
        result
            .rows
            .iter()
            .map(|row| {
                let where_clause = (!table.is_empty() && !db.is_empty())
                    .then(|| unique_condition(&result.columns, row, &key_columns))
                    .filter(|clause| !clause.is_empty());
                RenderedRow {
                    cells: row.iter().map(value_to_text).collect(),
                    sign: where_clause.as_deref().map(|c| self.signer.sign(c)),
                    where_clause,
                }
            })
            .collect()
    }

    /// Verifies a where clause issued by [`Sql::render_rows`].
    pub fn verify_where_clause(&self, where_clause: &str, signature: &str) -> AppResult<()> {
        if self.signer.verify(where_clause, signature) {
            Ok(())
        } else {
            Err(AppError::InvalidSignature)
        }
    }
}

fn non_empty(db: &str) -> Option<&str> {
    (!db.is_empty()).then_some(db)
}

fn format_duration(ms: u64) -> String {
    format!("{:.4}", ms as f64 / 1000.0)
}

fn result_message(result: &QueryResult, sql: &str, pagination: Option<&Pagination>) -> String {
    let took = format_duration(result.execution_time_ms);
    if !SqlAnalyzer::returns_rows(sql) {
        let affected = result.affected_rows.unwrap_or(0);
        return if affected == 1 {
            "1 row affected.".to_string()
        } else {
            format!("{affected} rows affected.")
        };
    }
    if result.is_empty() {
        return format!("{EMPTY_RESULT_MESSAGE} (Query took {took} seconds.)");
    }

    let (pos, total) = match pagination {
        Some(page) => (page.pos, page.total),
        None => (0, result.rows.len() as u64),
    };
    let last = (pos + result.rows.len() as u64).saturating_sub(1);
    format!("Showing rows {pos} - {last} ({total} total, Query took {took} seconds.)")
}

/// Result column positions that identify a row: the primary key when every
/// part of it is in the result, otherwise every column.
fn unique_key_columns(columns: &[ColumnInfo], table_columns: &[ColumnFull]) -> Vec<usize> {
    let primary: Vec<usize> = table_columns
        .iter()
        .filter(|c| c.key == "PRI")
        .map(|c| columns.iter().position(|r| r.name == c.field))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    if primary.is_empty() {
        (0..columns.len()).collect()
    } else {
        primary
    }
}

/// `` `a` = 1 AND `b` IS NULL `` condition matching one row.
pub fn unique_condition(columns: &[ColumnInfo], row: &[Value], key_columns: &[usize]) -> String {
    key_columns
        .iter()
        .filter_map(|&idx| {
            let column = backquote(&columns.get(idx)?.name);
            Some(match row.get(idx) {
                None | Some(Value::Null) => format!("{column} IS NULL"),
                Some(Value::Number(n)) => format!("{column} = {n}"),
                Some(value) => format!(
                    "{column} = {}",
                    quote_string(&value_to_text(value).unwrap_or_default())
                ),
            })
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
