//! Grizzly: a lazily-evaluated dataframe front-end that compiles relational
//! operations into backend-specific SQL and hands that text to an external
//! relational executor.
//!
//! The crate is organized leaf-first: [`schema`] and [`expr`] are the data
//! model, [`plan`] is the immutable logical-plan tree they build,
//! [`dataframe`] is the fluent builder users actually call, [`generator`]
//! lowers a plan to SQL text for one of a handful of [`generator::Dialect`]s,
//! and [`collect`] is the executor-boundary sink that ships that text to
//! whatever [`Executor`] the host registered via [`use_executor`].

pub mod collect;
pub mod dataframe;
pub mod error;
pub mod executor;
pub mod expr;
pub mod generator;
pub mod plan;
pub mod schema;
pub mod udf;

pub use collect::{CountOutcome, Rows};
pub use dataframe::{AggRequest, Ascending, Column, DataFrame, GroupedDataFrame, JoinOn};
pub use error::{GrizzlyError, Result};
pub use executor::{close, use_executor, Executor, Value};
pub use expr::{AggKind, ColRef, CompareOp, Expr, Literal, LogicalOp};
pub use generator::{Dialect, SqlGenerator};
pub use plan::{JoinKind, Plan};
pub use schema::{ColSpec, ColType, Schema};
pub use udf::{TypeTag, UdfDef};
