//! The executor boundary's sink operations: everything that actually ships
//! SQL to the registered [`Executor`] and interprets the row set that comes
//! back. Everything upstream of this module is pure plan construction.

use crate::dataframe::{Ascending, DataFrame};
use crate::error::{GrizzlyError, Result};
use crate::executor::{with_executor, Value};
use crate::expr::{AggArg, AggKind, ColRef, Expr, Literal};
use crate::generator::{Dialect, SqlGenerator};
use crate::plan::Plan;
use crate::schema::ColType;

/// A materialized result set: column metadata plus the row tuples returned
/// by the executor, in the order the executor produced them.
#[derive(Debug, Clone)]
pub struct Rows {
    pub columns: Vec<(String, ColType)>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    /// `collect(includeHeader=true)` — prepends a synthetic row of column
    /// names rendered as [`Value::Str`].
    pub fn with_header_row(mut self) -> Self {
        let header: Vec<Value> = self
            .columns
            .iter()
            .map(|(name, _)| Value::Str(name.clone()))
            .collect();
        self.rows.insert(0, header);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn run(dialect: Dialect, plan: &Plan) -> Result<Rows> {
    let sql = SqlGenerator::new(dialect).generate(plan)?;
    log::debug!("executing: {sql}");
    let (columns, rows) = with_executor(|e| e.execute(&sql))?;
    Ok(Rows { columns, rows })
}

/// Extracts a `0`-valued-or-otherwise single scalar from a one-row,
/// one-column result set, as produced by `len`/scalar aggregates.
fn single_cell(rows: Rows) -> Result<Value> {
    rows.rows
        .into_iter()
        .next()
        .and_then(|mut row| row.pop())
        .ok_or_else(|| GrizzlyError::executor("executor returned no rows for a scalar query"))
}

fn value_as_usize(value: &Value) -> Result<usize> {
    match value {
        Value::Int(v) => Ok(*v as usize),
        other => Err(GrizzlyError::executor(format!(
            "expected an integer count, got {other:?}"
        ))),
    }
}

impl DataFrame {
    /// `collect(includeHeader?)` — materializes every row.
    pub fn collect(&self, dialect: Dialect, include_header: bool) -> Result<Rows> {
        let rows = run(dialect, self.plan())?;
        Ok(if include_header {
            rows.with_header_row()
        } else {
            rows
        })
    }

    /// `len(df)` — rewrites the plan as `SELECT COUNT(*) FROM (plan)`.
    pub fn len(&self, dialect: Dialect) -> Result<usize> {
        let sql = SqlGenerator::new(dialect).generate_count_star(self.plan())?;
        log::debug!("executing: {sql}");
        let (columns, rows) = with_executor(|e| e.execute(&sql))?;
        let value = single_cell(Rows { columns, rows })?;
        value_as_usize(&value)
    }

    /// `shape` — `(schema_width, len)`.
    pub fn shape(&self, dialect: Dialect) -> Result<(usize, usize)> {
        Ok((self.schema().len(), self.len(dialect)?))
    }

    /// `count(col?)` — a scalar count when `col` is given, otherwise a
    /// materialized UNION ALL of per-column counts (mirrors
    /// [`DataFrame::agg_all`] but executes immediately).
    pub fn count(&self, dialect: Dialect, col: Option<&str>) -> Result<CountOutcome> {
        match col {
            Some(name) => Ok(CountOutcome::Scalar(self.scalar_agg(dialect, AggKind::Count, name)?)),
            None => Ok(CountOutcome::PerColumn(self.agg_all(AggKind::Count)?.collect(dialect, false)?)),
        }
    }

    /// The scalar form of `df.max("x")` et al: executes a single-row,
    /// single-column `Aggregation` and returns the one cell.
    pub fn scalar_agg(&self, dialect: Dialect, kind: AggKind, col: &str) -> Result<Value> {
        let schema = self.schema();
        let ty = schema
            .get(col)
            .ok_or_else(|| GrizzlyError::schema(format!("column '{col}' not found in schema")))?;
        if matches!(kind, AggKind::Sum | AggKind::Mean) && ty != ColType::Numeric {
            return Err(GrizzlyError::schema(format!(
                "{kind:?} cannot be applied to TEXT column '{col}'"
            )));
        }
        let agg_expr = Expr::Agg {
            kind,
            arg: AggArg::Column(ColRef::new(col, self.plan().id)),
            alias: Some(kind.as_label().to_string()),
        };
        let plan = Plan::aggregation(self.plan().clone(), vec![agg_expr], None)?;
        let rows = run(dialect, &plan)?;
        single_cell(rows)
    }

    /// `tuple in df`.
    pub fn contains_tuple(&self, dialect: Dialect, values: Vec<Literal>) -> Result<bool> {
        let predicate = self.containment_predicate_tuple(values)?;
        self.run_exists(dialect, &predicate)
    }

    /// `v in df`.
    pub fn contains_scalar(&self, dialect: Dialect, value: Literal) -> Result<bool> {
        let predicate = self.containment_predicate_scalar(value)?;
        self.run_exists(dialect, &predicate)
    }

    fn run_exists(&self, dialect: Dialect, predicate: &Expr) -> Result<bool> {
        let sql = SqlGenerator::new(dialect).generate_exists(self.plan(), predicate)?;
        log::debug!("executing: {sql}");
        let (columns, rows) = with_executor(|e| e.execute(&sql))?;
        let value = single_cell(Rows { columns, rows })?;
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(n) => Ok(n != 0),
            other => Err(GrizzlyError::executor(format!(
                "expected a boolean EXISTS result, got {other:?}"
            ))),
        }
    }

    /// `at[index, col]` — a single cell.
    pub fn at(&self, dialect: Dialect, index: Literal, col: &str) -> Result<Value> {
        let predicate = self.index_predicate(vec![index])?;
        let narrowed = self.select(&[col])?;
        let filtered = narrowed.filter_on_plan(predicate);
        let rows = run(dialect, filtered.plan())?;
        single_cell(rows)
    }

    /// `loc[index]` — the matching row(s).
    pub fn loc(&self, dialect: Dialect, indices: Vec<Literal>) -> Result<Rows> {
        let predicate = self.index_predicate(indices)?;
        let filtered = self.filter_on_plan(predicate);
        run(dialect, filtered.plan())
    }

    /// Helper shared by `at`/`loc`: a WHERE-position filter regardless of
    /// what kind of node `self` currently wraps (these sinks never sit on
    /// an `Aggregation`, so HAVING promotion never applies here).
    fn filter_on_plan(&self, predicate: Expr) -> DataFrame {
        // `DataFrame::filter` already defaults to WHERE outside of
        // Aggregation/HAVING contexts, which is exactly what at/loc need.
        self.filter(predicate)
    }

    /// `tail(n)` — last `n` rows, in original order.
    pub fn tail(&self, dialect: Dialect, n: u64) -> Result<Rows> {
        let sort_key = self
            .index_col()
            .map(String::from)
            .or_else(|| self.schema().names().next().map(String::from))
            .ok_or_else(|| GrizzlyError::value("tail() requires at least one column"))?;
        let reversed = self
            .sort_values(&[sort_key], Ascending::All(false))?
            .limit(n);
        let mut rows = run(dialect, reversed.plan())?;
        rows.rows.reverse();
        Ok(rows)
    }

    /// `iterrows()` — `(ordinal, row)` pairs.
    pub fn iterrows(&self, dialect: Dialect) -> Result<Vec<(usize, Vec<Value>)>> {
        let rows = run(dialect, self.plan())?;
        Ok(rows.rows.into_iter().enumerate().collect())
    }

    /// `itertuples()` — each row rendered as `Grizzly(col1=.., col2=..)`.
    pub fn itertuples(&self, dialect: Dialect) -> Result<Vec<String>> {
        let rows = run(dialect, self.plan())?;
        Ok(rows
            .rows
            .iter()
            .map(|row| {
                let fields = rows
                    .columns
                    .iter()
                    .zip(row.iter())
                    .map(|((name, _), value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Grizzly({fields})")
            })
            .collect())
    }

    /// `items()` — pivots rows into `(column_name, column_values)` pairs.
    pub fn items(&self, dialect: Dialect) -> Result<Vec<(String, Vec<Value>)>> {
        let rows = run(dialect, self.plan())?;
        Ok(rows
            .columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| {
                let values = rows.rows.iter().map(|row| row[i].clone()).collect();
                (name.clone(), values)
            })
            .collect())
    }

    /// `show(limit?, pretty?, maxColWidth?)` — formats a result set for
    /// terminal display and prints it, returning the same string.
    pub fn show(
        &self,
        dialect: Dialect,
        limit: Option<u64>,
        pretty: bool,
        max_col_width: Option<usize>,
    ) -> Result<String> {
        let rows = match limit {
            Some(n) => run(dialect, self.limit(n).plan())?,
            None => run(dialect, self.plan())?,
        };
        let rendered = render_table(&rows, pretty, max_col_width);
        println!("{rendered}");
        Ok(rendered)
    }
}

/// Outcome of [`DataFrame::count`]: a single scalar, or one row per column.
#[derive(Debug, Clone)]
pub enum CountOutcome {
    Scalar(Value),
    PerColumn(Rows),
}

fn render_table(rows: &Rows, pretty: bool, max_col_width: Option<usize>) -> String {
    let truncate = |s: String| -> String {
        match max_col_width {
            Some(w) if s.chars().count() > w => format!("{}…", s.chars().take(w).collect::<String>()),
            _ => s,
        }
    };
    let header: Vec<String> = rows.columns.iter().map(|(n, _)| truncate(n.clone())).collect();
    let body: Vec<Vec<String>> = rows
        .rows
        .iter()
        .map(|row| row.iter().map(|v| truncate(v.to_string())).collect())
        .collect();
    if !pretty {
        let mut lines = vec![header.join("\t")];
        lines.extend(body.iter().map(|r| r.join("\t")));
        return lines.join("\n");
    }
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }
    let pad_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    let sep: String = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    let mut lines = vec![pad_row(&header), sep];
    lines.extend(body.iter().map(|r| pad_row(r)));
    lines.join("\n")
}
