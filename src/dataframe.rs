//! The dataframe facade: the user-visible builder that wraps a plan node
//! and returns new facades pointing to new plan nodes. Every method here is
//! purely syntactic — it allocates IR, it never touches the executor.

use std::rc::Rc;

use crate::error::{GrizzlyError, Result};
use crate::expr::{AggArg, AggKind, ColRef, Expr, Literal};
use crate::plan::{FilterKind, JoinKind, Plan, PlanKind, ProjectItem};
use crate::schema::{ColSpec, ColType, Schema};
use crate::udf::UdfDef;

/// A single column of the current projection, carrying enough of the
/// originating plan to build comparisons, arithmetic, and UDF calls that
/// resolve back to it.
#[derive(Debug, Clone)]
pub struct Column {
    origin: Rc<Plan>,
    reference: ColRef,
}

impl Column {
    pub fn expr(&self) -> Expr {
        Expr::Column(self.reference.clone())
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn eq(&self, rhs: Expr) -> Expr {
        self.expr().eq(rhs)
    }

    pub fn ne(&self, rhs: Expr) -> Expr {
        self.expr().ne(rhs)
    }

    pub fn lt(&self, rhs: Expr) -> Expr {
        self.expr().lt(rhs)
    }

    pub fn le(&self, rhs: Expr) -> Expr {
        self.expr().le(rhs)
    }

    pub fn gt(&self, rhs: Expr) -> Expr {
        self.expr().gt(rhs)
    }

    pub fn ge(&self, rhs: Expr) -> Expr {
        self.expr().ge(rhs)
    }

    pub fn add(&self, rhs: Expr) -> Expr {
        self.expr().add(rhs)
    }

    pub fn sub(&self, rhs: Expr) -> Expr {
        self.expr().sub(rhs)
    }

    pub fn mul(&self, rhs: Expr) -> Expr {
        self.expr().mul(rhs)
    }

    pub fn div(&self, rhs: Expr) -> Expr {
        self.expr().div(rhs)
    }

    pub fn is_in(&self, list: Vec<Expr>) -> Expr {
        self.expr().is_in(list)
    }

    /// `df["x"].map(f)` — a computed-column UDF call over this one column.
    pub fn map(&self, def: Rc<UdfDef>) -> Expr {
        Expr::Udf {
            def,
            args: vec![self.expr()],
            alias: None,
        }
    }

    /// The plan this column was drawn from, needed by
    /// [`crate::collect`]'s scalar aggregate sinks to agree with the
    /// dataframe-level `df.min("x")` spelling (`test_colAggMin` et al.).
    pub fn origin(&self) -> &Rc<Plan> {
        &self.origin
    }
}

/// One requested aggregate: `col: None` fans out to every column of a
/// schema-legal type for `kind` (SUM/MEAN to NUMERIC columns, everything
/// else to every column).
#[derive(Debug, Clone)]
pub struct AggRequest {
    pub kind: AggKind,
    pub col: Option<String>,
    pub alias: Option<String>,
}

impl AggRequest {
    pub fn new(kind: AggKind, col: Option<impl Into<String>>, alias: Option<impl Into<String>>) -> Self {
        Self {
            kind,
            col: col.map(Into::into),
            alias: alias.map(Into::into),
        }
    }
}

/// `on` argument to [`DataFrame::join`]: either a same-named-or-different
/// column pair or an arbitrary condition expression.
pub enum JoinOn {
    Columns(String, String),
    Condition(Expr),
}

/// `ascending` argument to [`DataFrame::sort_values`]: one flag for every
/// key, or one flag per key.
#[derive(Debug, Clone)]
pub enum Ascending {
    All(bool),
    PerKey(Vec<bool>),
}

/// A column list that is eligible for `kind`'s fan-out: SUM/MEAN only make
/// sense over NUMERIC columns, everything else is legal over any column.
fn eligible_columns(schema: &Schema, kind: AggKind) -> Vec<String> {
    match kind {
        AggKind::Sum | AggKind::Mean => schema
            .numeric_columns()
            .into_iter()
            .map(String::from)
            .collect(),
        AggKind::Count | AggKind::Min | AggKind::Max => {
            schema.names().map(String::from).collect()
        }
    }
}

/// Expands a list of [`AggRequest`]s against `schema` into concrete
/// `Expr::Agg` nodes, fanning out any request whose `col` is `None`.
fn build_agg_exprs(origin_id: u64, schema: &Schema, requests: &[AggRequest]) -> Result<Vec<Expr>> {
    if !schema.is_known() {
        return Err(GrizzlyError::schema(
            "aggregation requires a known schema to resolve column names",
        ));
    }
    let mut out = Vec::new();
    for req in requests {
        match &req.col {
            Some(name) => {
                let ty = schema
                    .get(name)
                    .ok_or_else(|| GrizzlyError::schema(format!("column '{name}' not found in schema")))?;
                if matches!(req.kind, AggKind::Sum | AggKind::Mean) && ty != ColType::Numeric {
                    return Err(GrizzlyError::schema(format!(
                        "{:?} cannot be applied to TEXT column '{name}'",
                        req.kind
                    )));
                }
                out.push(Expr::Agg {
                    kind: req.kind,
                    arg: AggArg::Column(ColRef::new(name.clone(), origin_id)),
                    alias: req.alias.clone(),
                });
            }
            None => {
                for name in eligible_columns(schema, req.kind) {
                    out.push(Expr::Agg {
                        kind: req.kind,
                        arg: AggArg::Column(ColRef::new(name.clone(), origin_id)),
                        alias: Some(req.alias.clone().unwrap_or_else(|| format!("{}_{name}", req.kind.as_label()))),
                    });
                }
            }
        }
    }
    Ok(out)
}

/// Intermediate state after `.groupby(keys)`. Call [`Self::agg`] (or one of
/// the single-kind shortcuts) to produce an [`Aggregation`](PlanKind::Aggregation)-backed
/// [`DataFrame`], or [`Self::finish`] to materialize a keys-only `GROUP BY`
/// with no aggregates.
#[derive(Debug, Clone)]
pub struct GroupedDataFrame {
    child: Rc<Plan>,
    keys: Vec<ColRef>,
}

impl GroupedDataFrame {
    pub fn agg(self, requests: Vec<AggRequest>) -> Result<DataFrame> {
        let exprs = build_agg_exprs(self.child.id, &self.child.schema, &requests)?;
        let plan = Plan::aggregation(self.child, exprs, Some(self.keys))?;
        Ok(DataFrame { plan, index_col: None })
    }

    pub fn min(self, col: Option<&str>, alias: Option<&str>) -> Result<DataFrame> {
        self.agg(vec![AggRequest::new(AggKind::Min, col, alias)])
    }

    pub fn max(self, col: Option<&str>, alias: Option<&str>) -> Result<DataFrame> {
        self.agg(vec![AggRequest::new(AggKind::Max, col, alias)])
    }

    pub fn sum(self, col: Option<&str>, alias: Option<&str>) -> Result<DataFrame> {
        self.agg(vec![AggRequest::new(AggKind::Sum, col, alias)])
    }

    pub fn mean(self, col: Option<&str>, alias: Option<&str>) -> Result<DataFrame> {
        self.agg(vec![AggRequest::new(AggKind::Mean, col, alias)])
    }

    pub fn count(self, col: Option<&str>, alias: Option<&str>) -> Result<DataFrame> {
        self.agg(vec![AggRequest::new(AggKind::Count, col, alias)])
    }

    /// `COUNT(*)` per group, using the `Star` pseudo-column rather than
    /// fanning out over every column — the one place this facade needs it.
    pub fn count_rows(self, alias: impl Into<String>) -> Result<DataFrame> {
        let expr = Expr::Agg {
            kind: AggKind::Count,
            arg: AggArg::Star,
            alias: Some(alias.into()),
        };
        let plan = Plan::aggregation(self.child, vec![expr], Some(self.keys))?;
        Ok(DataFrame { plan, index_col: None })
    }

    /// Terminates the grouping with no aggregates: a bare `GROUP BY` over
    /// the key columns.
    pub fn finish(self) -> DataFrame {
        DataFrame {
            plan: Plan::group_by(self.child, self.keys),
            index_col: None,
        }
    }
}

/// The lazy dataframe builder. Cloning is cheap (an `Rc` bump); every
/// transformation returns a new value pointing at a new plan node, and the
/// node it was built from is left untouched.
#[derive(Debug, Clone)]
pub struct DataFrame {
    plan: Rc<Plan>,
    index_col: Option<String>,
}

impl DataFrame {
    pub fn read_table(table: impl Into<String>, schema: Option<Schema>) -> Self {
        log::debug!("read_table");
        Self {
            plan: Plan::scan(table, schema.unwrap_or_else(Schema::unknown)),
            index_col: None,
        }
    }

    pub fn read_table_indexed(
        table: impl Into<String>,
        schema: Option<Schema>,
        index: impl Into<String>,
    ) -> Self {
        let mut df = Self::read_table(table, schema);
        df.index_col = Some(index.into());
        df
    }

    pub fn read_external(
        path: impl Into<String>,
        columns: Vec<(impl Into<String>, ColSpec)>,
        header: bool,
        delim: Option<char>,
        format: impl Into<String>,
    ) -> Self {
        log::debug!("read_external");
        Self {
            plan: Plan::external_scan(path, columns, header, delim, format),
            index_col: None,
        }
    }

    pub fn plan(&self) -> &Rc<Plan> {
        &self.plan
    }

    pub fn schema(&self) -> &Schema {
        &self.plan.schema
    }

    pub fn index_col(&self) -> Option<&str> {
        self.index_col.as_deref()
    }

    fn with_plan(&self, plan: Rc<Plan>) -> DataFrame {
        DataFrame {
            plan,
            index_col: self.index_col.clone(),
        }
    }

    /// `df.x` / `df.get("x")` — a column reference into the current node,
    /// not a new dataframe.
    pub fn col(&self, name: &str) -> Result<Column> {
        if self.plan.schema.is_known() && !self.plan.schema.contains(name) {
            return Err(GrizzlyError::schema(format!(
                "column '{name}' not found in schema"
            )));
        }
        Ok(Column {
            origin: self.plan.clone(),
            reference: ColRef::new(name, self.plan.id),
        })
    }

    /// `df[["a", "b"]]` and `df["a"]` both go through here: a projection
    /// that preserves the requested order.
    pub fn select(&self, names: &[impl AsRef<str>]) -> Result<DataFrame> {
        let items = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                if self.plan.schema.is_known() && !self.plan.schema.contains(n) {
                    return Err(GrizzlyError::schema(format!(
                        "column '{n}' not found in schema"
                    )));
                }
                Ok(ProjectItem::passthrough(ColRef::new(n, self.plan.id)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_plan(Plan::projection(self.plan.clone(), items)))
    }

    /// Projects a single computed expression as `name`, e.g. `df[(a + b)]`
    /// aliased on assignment.
    pub fn select_expr(&self, name: impl Into<String>, expr: Expr) -> DataFrame {
        let item = ProjectItem::computed(name, expr);
        self.with_plan(Plan::projection(self.plan.clone(), vec![item]))
    }

    /// `df[pred]` — a boolean-expression index is always a filter, never a
    /// projection. A filter sitting directly on an `Aggregation` is a
    /// HAVING-position filter; everything else is WHERE. A HAVING filter on
    /// top of another HAVING filter is itself HAVING, so the chain merges
    /// with AND at emission (see [`crate::generator`]).
    pub fn filter(&self, predicate: Expr) -> DataFrame {
        let kind = match &self.plan.kind {
            PlanKind::Aggregation { .. } => FilterKind::Having,
            PlanKind::Filter {
                kind: FilterKind::Having,
                ..
            } => FilterKind::Having,
            _ => FilterKind::Where,
        };
        self.with_plan(Plan::filter(self.plan.clone(), predicate, kind))
    }

    /// `df[name] = expr` — appends (or replaces) a computed column on the
    /// current node's projection. If the current node is already a
    /// `Projection`, its item list is extended in place of being re-wrapped
    /// in another projection layer; otherwise a new `Projection` is
    /// synthesized over every existing column plus the new one. Either way
    /// the node this was called on is left exactly as it was — only the
    /// returned value's plan pointer is new.
    pub fn assign(&self, name: impl Into<String>, expr: Expr) -> DataFrame {
        let name = name.into();
        let (child, mut items) = match &self.plan.kind {
            PlanKind::Projection { child, items } => (child.clone(), items.clone()),
            _ => {
                let items = self
                    .plan
                    .schema
                    .names()
                    .map(|n| ProjectItem::passthrough(ColRef::new(n, self.plan.id)))
                    .collect();
                (self.plan.clone(), items)
            }
        };
        if let Some(slot) = items.iter_mut().find(|i| i.name == name) {
            slot.expr = expr;
        } else {
            items.push(ProjectItem::computed(name, expr));
        }
        self.with_plan(Plan::projection(child, items))
    }

    /// In-place form of [`Self::assign`], matching the source's
    /// `df[name] = expr` statement syntax.
    pub fn assign_mut(&mut self, name: impl Into<String>, expr: Expr) {
        *self = self.assign(name, expr);
    }

    /// `df["newcol"] = df["x"].map(udf)` convenience: builds the UDF call
    /// expression and assigns it in one step.
    pub fn map_column(&mut self, source_col: &str, def: Rc<UdfDef>, alias: impl Into<String>) -> Result<()> {
        let col = self.col(source_col)?;
        let expr = col.map(def);
        self.assign_mut(alias, expr);
        Ok(())
    }

    pub fn groupby(&self, keys: &[impl AsRef<str>]) -> Result<GroupedDataFrame> {
        let keys = keys
            .iter()
            .map(|k| {
                let k = k.as_ref();
                if self.plan.schema.is_known() && !self.plan.schema.contains(k) {
                    return Err(GrizzlyError::schema(format!(
                        "column '{k}' not found in schema"
                    )));
                }
                Ok(ColRef::new(k, self.plan.id))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GroupedDataFrame {
            child: self.plan.clone(),
            keys,
        })
    }

    /// Whole-dataframe aggregation with no `groupby` in effect and no
    /// explicit column (`df.max()`): fans out over every eligible column
    /// and stays lazy, synthesized as a UNION ALL of one `(colname, value)`
    /// row per column. The scalar form (`df.max("x")`) lives in
    /// [`crate::collect`] since it requires an executor round trip.
    pub fn agg_all(&self, kind: AggKind) -> Result<DataFrame> {
        if !self.plan.schema.is_known() {
            return Err(GrizzlyError::schema(
                "whole-dataframe aggregation requires a known schema",
            ));
        }
        let cols = eligible_columns(&self.plan.schema, kind);
        if cols.is_empty() {
            return Err(GrizzlyError::schema(format!(
                "no columns eligible for {kind:?}"
            )));
        }
        let label = kind.as_label();
        let mut branches = Vec::with_capacity(cols.len());
        for name in &cols {
            let agg_expr = Expr::Agg {
                kind,
                arg: AggArg::Column(ColRef::new(name.clone(), self.plan.id)),
                alias: Some(label.to_string()),
            };
            let items = vec![
                ProjectItem::computed("colname", Expr::lit(Literal::Str(name.clone()))),
                ProjectItem::computed(label, agg_expr),
            ];
            branches.push(Plan::projection(self.plan.clone(), items));
        }
        Ok(self.with_plan(Plan::set_op(branches)))
    }

    pub fn join(&self, other: &DataFrame, on: JoinOn, kind: JoinKind) -> Result<DataFrame> {
        let condition = match on {
            JoinOn::Condition(e) => e,
            JoinOn::Columns(l, r) => {
                Expr::col(ColRef::new(l, self.plan.id)).eq(Expr::col(ColRef::new(r, other.plan.id)))
            }
        };
        let plan = Plan::join(self.plan.clone(), other.plan.clone(), Some(condition), kind);
        Ok(DataFrame { plan, index_col: None })
    }

    /// `df.map(other_df)` — a natural join has no explicit condition.
    pub fn natural_join(&self, other: &DataFrame) -> DataFrame {
        let plan = Plan::join(self.plan.clone(), other.plan.clone(), None, JoinKind::Natural);
        DataFrame { plan, index_col: None }
    }

    pub fn distinct(&self) -> DataFrame {
        self.with_plan(Plan::distinct(self.plan.clone()))
    }

    pub fn sort_values(&self, by: &[impl AsRef<str>], ascending: Ascending) -> Result<DataFrame> {
        let flags: Vec<bool> = match ascending {
            Ascending::All(flag) => vec![flag; by.len()],
            Ascending::PerKey(flags) => {
                if flags.len() != by.len() {
                    return Err(GrizzlyError::value(
                        "sort_values: ascending vector length must match key count",
                    ));
                }
                flags
            }
        };
        let keys = by
            .iter()
            .zip(flags)
            .map(|(name, asc)| (ColRef::new(name.as_ref(), self.plan.id), asc))
            .collect();
        Ok(self.with_plan(Plan::sort(self.plan.clone(), keys)))
    }

    pub fn limit(&self, n: u64) -> DataFrame {
        self.with_plan(Plan::limit(self.plan.clone(), n, 0))
    }

    /// `df[a:b]` — a Python-style slice, `limit = b`, `offset = a`.
    pub fn slice(&self, start: u64, end: u64) -> Result<DataFrame> {
        if end < start {
            return Err(GrizzlyError::value("slice end must not precede start"));
        }
        Ok(self.with_plan(Plan::limit(self.plan.clone(), end, start)))
    }

    pub fn describe(&self) -> DataFrame {
        DataFrame {
            plan: Plan::describe(self.plan.clone()),
            index_col: None,
        }
    }

    /// `v in df` — legal only when the current projection has arity 1.
    /// Builds the equality predicate; [`crate::collect`] turns it into the
    /// `EXISTS` round trip.
    pub fn containment_predicate_scalar(&self, value: Literal) -> Result<Expr> {
        if self.plan.schema.len() != 1 {
            return Err(GrizzlyError::value(
                "scalar containment requires a single-column projection",
            ));
        }
        let (name, ty) = &self.plan.schema.columns()[0];
        check_literal_matches(*ty, &value)?;
        Ok(Expr::col(ColRef::new(name.clone(), self.plan.id)).eq(Expr::lit(value)))
    }

    /// `(v1, v2, ...) in df` — tuple arity must match the projected schema
    /// width exactly.
    pub fn containment_predicate_tuple(&self, values: Vec<Literal>) -> Result<Expr> {
        if !self.plan.schema.is_known() {
            return Err(GrizzlyError::schema("containment requires a known schema"));
        }
        if values.len() != self.plan.schema.len() {
            return Err(GrizzlyError::value(format!(
                "containment arity mismatch: schema has {} columns, {} values given",
                self.plan.schema.len(),
                values.len()
            )));
        }
        let mut predicate: Option<Expr> = None;
        for ((name, ty), value) in self.plan.schema.columns().iter().zip(values.into_iter()) {
            check_literal_matches(*ty, &value)?;
            let eq = Expr::col(ColRef::new(name.clone(), self.plan.id)).eq(Expr::lit(value));
            predicate = Some(match predicate {
                Some(p) => p.and(eq),
                None => eq,
            });
        }
        predicate.ok_or_else(|| GrizzlyError::value("containment requires at least one column"))
    }

    /// `loc[index]` / `at[index, col]` share the index-column requirement;
    /// this builds the predicate and leaves execution to [`crate::collect`].
    pub fn index_predicate(&self, values: Vec<Literal>) -> Result<Expr> {
        let idx = self
            .index_col
            .clone()
            .ok_or_else(|| GrizzlyError::value("no index column registered for loc/at"))?;
        let col_expr = Expr::col(ColRef::new(idx, self.plan.id));
        match values.len() {
            0 => Err(GrizzlyError::value("loc/at requires at least one value")),
            1 => Ok(col_expr.eq(Expr::lit(values.into_iter().next().unwrap()))),
            _ => Ok(col_expr.is_in(values.into_iter().map(Expr::lit).collect())),
        }
    }
}

/// Checks a containment/loc literal's type against the column's declared
/// [`ColType`], raising [`GrizzlyError::Type`] on mismatch. `NULL` matches
/// either type since SQL `NULL` carries no type of its own.
fn check_literal_matches(ty: ColType, value: &Literal) -> Result<()> {
    let matches = match (ty, value) {
        (_, Literal::Null) => true,
        (ColType::Numeric, Literal::Int(_) | Literal::Float(_)) => true,
        (ColType::Text, Literal::Str(_) | Literal::Bool(_)) => true,
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(GrizzlyError::type_error(format!(
            "literal {value:?} does not match column type {ty}"
        )))
    }
}
