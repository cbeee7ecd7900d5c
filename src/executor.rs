//! The executor boundary's external contract: the actual database driver is
//! out of scope for this crate and is supplied by the host as an
//! [`Executor`] implementation.

use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::error::{GrizzlyError, Result};
use crate::schema::{ColType, Schema};

/// One cell of a materialized row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// The external relational executor contract: run a SQL string and get back
/// column metadata plus rows, or answer a table's schema for
/// `inferSchema`. The core never opens a connection itself.
pub trait Executor {
    fn execute(&mut self, sql: &str) -> Result<(Vec<(String, ColType)>, Vec<Vec<Value>>)>;

    fn table_schema(&mut self, name: &str) -> Result<Schema>;

    fn close(&mut self);
}

static CURRENT_EXECUTOR: Lazy<Mutex<Option<Box<dyn Executor + Send>>>> =
    Lazy::new(|| Mutex::new(None));

/// Registers the process-wide executor. Operations that require execution
/// fail with [`GrizzlyError::Executor`] until one is registered.
pub fn use_executor(executor: impl Executor + Send + 'static) {
    log::debug!("registering executor");
    let mut slot = CURRENT_EXECUTOR.lock().expect("executor mutex poisoned");
    *slot = Some(Box::new(executor));
}

/// Closes and unregisters the current executor.
pub fn close() {
    log::debug!("closing executor");
    let mut slot = CURRENT_EXECUTOR.lock().expect("executor mutex poisoned");
    if let Some(mut executor) = slot.take() {
        executor.close();
    }
}

/// Runs `f` against the registered executor, or returns
/// [`GrizzlyError::Executor`] if none is registered.
pub(crate) fn with_executor<R>(f: impl FnOnce(&mut dyn Executor) -> Result<R>) -> Result<R> {
    let mut slot = CURRENT_EXECUTOR.lock().expect("executor mutex poisoned");
    match slot.as_mut() {
        Some(executor) => f(executor.as_mut()),
        None => Err(GrizzlyError::executor(
            "no executor registered: call grizzly::use_executor() first",
        )),
    }
}

/// Serializes tests that register/close the process-wide executor. Cargo
/// runs `#[test]` functions on multiple threads by default, and
/// [`CURRENT_EXECUTOR`] is shared state — without this, one test's
/// `use_executor`/`close` races another's. Exposed `pub(crate)` so
/// `collect.rs`'s own executor-touching tests serialize against these too;
/// `tests/` integration tests (compiled into separate binary processes) get
/// their own instance via `tests/common`, which doesn't need to share this one.
#[cfg(test)]
pub(crate) static TEST_EXECUTOR_LOCK: Mutex<()> = Mutex::new(());
