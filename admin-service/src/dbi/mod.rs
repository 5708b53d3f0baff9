//! Database access facade.
//!
//! Controllers and services talk to the server only through
//! [`DatabaseInterface`], so tests can swap the MySQL pool for canned results.

mod mysql;

#[cfg(test)]
pub mod dummy;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use common::errors::AppResult;
use common::models::{ColumnFull, QueryResult};
use common::utils::backquote;

pub use mysql::MySqlDbi;

/// One server connection. Statements run through the same session share its
/// state, such as the selected database or open transactions.
#[async_trait]
pub trait DbSession: Send {
    async fn query(&mut self, sql: &str) -> AppResult<QueryResult>;
}

#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    /// Opens a session with `database` selected, or with no database selected
    /// when `None`.
    async fn session(&self, database: Option<&str>) -> AppResult<Box<dyn DbSession>>;

    /// Runs a single statement in its own session.
    async fn query(&self, database: Option<&str>, sql: &str) -> AppResult<QueryResult> {
        let mut session = self.session(database).await?;
        session.query(sql).await
    }

    /// Version of the connected server.
    async fn server_version(&self) -> AppResult<ServerVersion>;

    /// Round-trip time of a trivial query.
    async fn ping(&self) -> AppResult<Duration>;

    /// First row of the result, if any.
    async fn fetch_single_row(
        &self,
        database: Option<&str>,
        sql: &str,
    ) -> AppResult<Option<Map<String, Value>>> {
        let result = self.query(database, sql).await?;
        Ok(result.row_map(0))
    }

    /// Columns of a table as reported by `SHOW FULL COLUMNS`.
    async fn get_columns(&self, database: &str, table: &str) -> AppResult<Vec<ColumnFull>> {
        let sql = format!(
            "SHOW FULL COLUMNS FROM {}.{}",
            backquote(database),
            backquote(table)
        );
        let result = self.query(None, &sql).await?;
        Ok((0..result.rows.len())
            .map(|row| ColumnFull {
                field: result.get_str(row, "Field").unwrap_or_default(),
                column_type: result.get_str(row, "Type").unwrap_or_default(),
                collation: result.get_str(row, "Collation"),
                is_nullable: result.get_str(row, "Null").as_deref() == Some("YES"),
                key: result.get_str(row, "Key").unwrap_or_default(),
                default: result.get_str(row, "Default"),
                extra: result.get_str(row, "Extra").unwrap_or_default(),
                privileges: result.get_str(row, "Privileges").unwrap_or_default(),
                comment: result.get_str(row, "Comment").unwrap_or_default(),
            })
            .collect())
    }

    /// Table names in `database`.
    async fn get_tables(&self, database: &str) -> AppResult<Vec<String>> {
        let sql = format!("SHOW TABLES FROM {}", backquote(database));
        Ok(self.query(None, &sql).await?.first_column())
    }
}

/// Parsed `VERSION()` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub is_mariadb: bool,
}

impl ServerVersion {
    /// Parses strings like `8.0.36` or `10.11.6-MariaDB-log`.
    pub fn parse(version: &str) -> Option<Self> {
        let numeric = version.split(|c: char| c == '-' || c == '+').next()?;
        let mut parts = numeric.split('.').map(|p| p.trim().parse::<u32>());
        let major = parts.next()?.ok()?;
        let minor = parts.next().and_then(Result::ok).unwrap_or(0);
        let patch = parts.next().and_then(Result::ok).unwrap_or(0);
        Some(Self {
            major,
            minor,
            patch,
            is_mariadb: version.to_ascii_lowercase().contains("mariadb"),
        })
    }

    /// `ALTER TABLE ... RENAME INDEX` needs MySQL 5.7 or MariaDB 10.5.2.
    pub fn supports_rename_index(&self) -> bool {
        let version = (self.major, self.minor, self.patch);
        if self.is_mariadb {
            version >= (10, 5, 2)
        } else {
            version >= (5, 7, 0)
        }
    }
}
