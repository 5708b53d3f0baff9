//! MySQL implementation of [`DatabaseInterface`] on a sqlx pool.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::{Column, Executor, MySql, MySqlPool, Row, TypeInfo};

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{ColumnInfo, QueryResult};
use common::utils::{backquote, SqlAnalyzer};

use super::{DatabaseInterface, DbSession, ServerVersion};

/// Pool-backed access to the administered server.
pub struct MySqlDbi {
    pool: MySqlPool,
}

impl MySqlDbi {
    /// Builds the pool without connecting; the first query opens a connection.
    ///
    /// Connections come back from a session with whatever database it
    /// selected. The server cannot deselect a database, so such connections
    /// are closed on release and every pooled connection has none selected.
    pub fn connect_lazy(config: &AppConfig) -> AppResult<Self> {
        // An import holds one connection while metadata lookups take another.
        let max_connections = config.max_connections.max(2);
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .after_release(|conn, _meta| {
                Box::pin(async move {
                    let selected: Option<String> = sqlx::query_scalar("SELECT DATABASE()")
                        .fetch_one(&mut *conn)
                        .await?;
                    Ok(selected.is_none())
                })
            })
            .connect_lazy(&config.server.database_url())
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;
        Ok(Self { pool })
    }
}

fn query_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            AppError::DatabaseConnection(e.to_string())
        }
        sqlx::Error::Database(db) => AppError::DatabaseQuery(db.message().to_string()),
        other => AppError::DatabaseQuery(other.to_string()),
    }
}

/// A pooled connection held for the lifetime of the session.
pub struct MySqlSession {
    conn: PoolConnection<MySql>,
}

#[async_trait]
impl DbSession for MySqlSession {
    async fn query(&mut self, sql: &str) -> AppResult<QueryResult> {
        let start = Instant::now();
        if !SqlAnalyzer::returns_rows(sql) {
            let done = (&mut *self.conn)
                .execute(sqlx::raw_sql(sql))
                .await
                .map_err(query_error)?;
            let elapsed = start.elapsed().as_millis() as u64;
            tracing::debug!(affected = done.rows_affected(), elapsed_ms = elapsed, "statement executed");
            return Ok(QueryResult::affected(done.rows_affected(), elapsed));
        }

        let rows = (&mut *self.conn)
            .fetch_all(sqlx::raw_sql(sql))
            .await
            .map_err(query_error)?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| ColumnInfo::new(c.name(), c.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();
        let rows: Vec<Vec<Value>> = rows.iter().map(decode_row).collect();
        tracing::debug!(rows = rows.len(), elapsed_ms = execution_time_ms, "query executed");

        Ok(QueryResult {
            columns,
            row_count: rows.len(),
            rows,
            affected_rows: None,
            execution_time_ms,
        })
    }
}

#[async_trait]
impl DatabaseInterface for MySqlDbi {
    async fn session(&self, database: Option<&str>) -> AppResult<Box<dyn DbSession>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        if let Some(database) = database.filter(|d| !d.is_empty()) {
            let use_stmt = format!("USE {}", backquote(database));
            (&mut *conn)
                .execute(sqlx::raw_sql(&use_stmt))
                .await
                .map_err(query_error)?;
        }
        Ok(Box::new(MySqlSession { conn }))
    }

    async fn server_version(&self) -> AppResult<ServerVersion> {
        let result = self.query(None, "SELECT VERSION()").await?;
        let raw = result.first_column().into_iter().next().unwrap_or_default();
        ServerVersion::parse(&raw)
            .ok_or_else(|| AppError::Internal(format!("unrecognised server version: {raw}")))
    }

    async fn ping(&self) -> AppResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(start.elapsed())
    }
}

fn decode_row(row: &MySqlRow) -> Vec<Value> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

/// Converts one cell to JSON, falling back to text when the typed decode fails.
fn decode_cell(row: &MySqlRow, idx: usize) -> Value {
    let type_name = row.column(idx).type_info().name().to_ascii_uppercase();
    let typed: Result<Option<Value>, sqlx::Error> = match type_name.as_str() {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(idx)
            .map(|v| v.map(Value::from)),
        t if t.ends_with("UNSIGNED") || t == "BIT" || t == "YEAR" => row
            .try_get::<Option<u64>, _>(idx)
            .map(|v| v.map(Value::from)),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)
            .map(|v| v.and_then(serde_json::Number::from_f64).map(Value::Number)),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(|v| v.map(|d| Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string()))),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map(|v| v.map(|d| Value::String(d.to_string()))),
        _ => return decode_text(row, idx),
    };

    match typed {
        Ok(Some(value)) => value,
        Ok(None) => Value::Null,
        Err(_) => decode_text(row, idx),
    }
}

fn decode_text(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(text) = row.try_get_unchecked::<Option<String>, _>(idx) {
        return text.map(Value::String).unwrap_or(Value::Null);
    }
    match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
        Ok(Some(bytes)) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        _ => Value::Null,
    }
}
