//! Error types raised by the facade, the expression IR, and the SQL generator.

use thiserror::Error;

/// The single error type threaded through every fallible Grizzly API.
///
/// [`GrizzlyError::Schema`] is raised for schema-shape problems (aggregating
/// a column that isn't there, summing a `TEXT` column, containment without a
/// schema), [`GrizzlyError::Expression`] for malformed predicates, and so on.
#[derive(Debug, Error)]
pub enum GrizzlyError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("expression error: {0}")]
    Expression(String),

    #[error("value error: {0}")]
    Value(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("executor error: {0}")]
    Executor(String),
}

pub type Result<T> = std::result::Result<T, GrizzlyError>;

impl GrizzlyError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn expression(msg: impl Into<String>) -> Self {
        Self::Expression(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn executor(msg: impl Into<String>) -> Self {
        Self::Executor(msg.into())
    }
}
