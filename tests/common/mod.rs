//! Shared test fixture: a `MockExecutor` standing in for a live database
//! connection, recording the SQL it was asked to run and replaying canned
//! rows. Plays the role the original test suite gave a real `sqlite3`
//! connection, without needing one.

use std::sync::{Mutex, MutexGuard};

use grizzly::{ColType, Executor, GrizzlyError, Result, Schema, Value};

/// Serializes any test in this binary that registers/closes the global
/// executor (`grizzly::use_executor`/`close`) — cargo runs `#[test]`
/// functions on multiple threads by default, and the registration is shared
/// process-wide state.
static EXECUTOR_TEST_LOCK: Mutex<()> = Mutex::new(());

pub fn lock_executor() -> MutexGuard<'static, ()> {
    EXECUTOR_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct MockExecutor {
    pub last_sql: Option<String>,
    pub all_sql: Vec<String>,
    pub columns: Vec<(String, ColType)>,
    pub rows: Vec<Vec<Value>>,
    pub table_schemas: Vec<(String, Schema)>,
}

impl MockExecutor {
    pub fn new(columns: Vec<(&str, ColType)>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            last_sql: None,
            all_sql: Vec::new(),
            columns: columns.into_iter().map(|(n, t)| (n.to_string(), t)).collect(),
            rows,
            table_schemas: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![], vec![])
    }
}

impl Executor for MockExecutor {
    fn execute(&mut self, sql: &str) -> Result<(Vec<(String, ColType)>, Vec<Vec<Value>>)> {
        self.last_sql = Some(sql.to_string());
        self.all_sql.push(sql.to_string());
        Ok((self.columns.clone(), self.rows.clone()))
    }

    fn table_schema(&mut self, name: &str) -> Result<Schema> {
        self.table_schemas
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| GrizzlyError::schema(format!("no such table: {name}")))
    }

    fn close(&mut self) {}
}

pub fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
