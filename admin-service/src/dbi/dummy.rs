//! In-memory [`DatabaseInterface`] for tests.
//!
//! Results are registered per exact SQL text and consumed once. Selected
//! databases and sessions are recorded so tests can check which schema and
//! which connection a statement ran in.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use common::errors::{AppError, AppResult};
use common::models::QueryResult;

use super::{DatabaseInterface, DbSession, ServerVersion};

struct Expected {
    query: String,
    result: Option<QueryResult>,
    consumed: bool,
}

/// One executed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub session: usize,
    pub database: Option<String>,
    pub sql: String,
}

#[derive(Default)]
struct DummyState {
    expected: Mutex<Vec<Expected>>,
    expected_selects: Mutex<VecDeque<String>>,
    executed: Mutex<Vec<Executed>>,
    sessions: Mutex<usize>,
}

impl DummyState {
    fn run(&self, session: usize, database: Option<&str>, sql: &str) -> AppResult<QueryResult> {
        self.executed.lock().unwrap().push(Executed {
            session,
            database: database.map(str::to_string),
            sql: sql.to_string(),
        });

        let mut expected = self.expected.lock().unwrap();
        let entry = expected
            .iter_mut()
            .find(|e| !e.consumed && e.query == sql)
            .ok_or_else(|| AppError::DatabaseQuery(format!("Not supported query: {sql}")))?;
        entry.consumed = true;
        entry
            .result
            .clone()
            .ok_or_else(|| AppError::DatabaseQuery(format!("Query failed: {sql}")))
    }
}

pub struct DbiDummy {
    state: Arc<DummyState>,
    version: String,
}

struct DummySession {
    state: Arc<DummyState>,
    id: usize,
    database: Option<String>,
}

impl Default for DbiDummy {
    fn default() -> Self {
        Self::new()
    }
}

impl DbiDummy {
    pub fn new() -> Self {
        Self {
            state: Arc::new(DummyState::default()),
            version: "8.0.36".to_string(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    fn push(&self, query: &str, result: Option<QueryResult>) {
        self.state.expected.lock().unwrap().push(Expected {
            query: query.to_string(),
            result,
            consumed: false,
        });
    }

    /// Registers a row-returning result.
    pub fn add_result(&self, query: &str, columns: &[&str], rows: Vec<Vec<Value>>) {
        self.push(query, Some(QueryResult::from_rows(columns, rows)));
    }

    /// Registers a fully specified result.
    pub fn add_query_result(&self, query: &str, result: QueryResult) {
        self.push(query, Some(result));
    }

    /// Registers a statement that changes `affected` rows.
    pub fn add_affected(&self, query: &str, affected: u64) {
        self.push(query, Some(QueryResult::affected(affected, 0)));
    }

    /// Registers a query that fails.
    pub fn add_failure(&self, query: &str) {
        self.push(query, None);
    }

    /// Expects the next session that selects a database to select `database`.
    pub fn add_select_db(&self, database: &str) {
        self.state
            .expected_selects
            .lock()
            .unwrap()
            .push_back(database.to_string());
    }

    /// Statements run so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed_in_sessions()
            .into_iter()
            .map(|e| e.sql)
            .collect()
    }

    /// Statements run so far with their session and selected database.
    pub fn executed_in_sessions(&self) -> Vec<Executed> {
        self.state.executed.lock().unwrap().clone()
    }

    pub fn assert_all_queries_consumed(&self) {
        let pending: Vec<String> = self
            .state
            .expected
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.consumed)
            .map(|e| e.query.clone())
            .collect();
        assert!(pending.is_empty(), "queries never executed: {pending:?}");
    }

    pub fn assert_all_selects_consumed(&self) {
        let pending = self.state.expected_selects.lock().unwrap();
        assert!(pending.is_empty(), "database selections never made: {pending:?}");
    }
}

#[async_trait]
impl DbSession for DummySession {
    async fn query(&mut self, sql: &str) -> AppResult<QueryResult> {
        self.state.run(self.id, self.database.as_deref(), sql)
    }
}

#[async_trait]
impl DatabaseInterface for DbiDummy {
    async fn session(&self, database: Option<&str>) -> AppResult<Box<dyn DbSession>> {
        let database = database.filter(|d| !d.is_empty());
        if let Some(database) = database {
            let mut selects = self.state.expected_selects.lock().unwrap();
            if let Some(expected) = selects.pop_front() {
                if expected != database {
                    return Err(AppError::DatabaseQuery(format!(
                        "selected database {database}, expected {expected}"
                    )));
                }
            }
        }

        let id = {
            let mut sessions = self.state.sessions.lock().unwrap();
            *sessions += 1;
            *sessions
        };
        Ok(Box::new(DummySession {
            state: self.state.clone(),
            id,
            database: database.map(str::to_string),
        }))
    }

    async fn server_version(&self) -> AppResult<ServerVersion> {
        ServerVersion::parse(&self.version)
            .ok_or_else(|| AppError::Internal("bad dummy version".into()))
    }

    async fn ping(&self) -> AppResult<Duration> {
        Ok(Duration::from_millis(0))
    }
}
