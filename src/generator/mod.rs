//! The SQL generator: a visitor over the logical plan that emits a single,
//! dialect-parameterized SQL string, allocating `$tN` aliases for every
//! wrapped subquery as it goes.

pub mod dialect;
pub mod udf;

use std::cell::Cell;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::error::{GrizzlyError, Result};
use crate::expr::{AggArg, ColRef, CompareOp, Expr, Literal, Precedence};
use crate::plan::{FilterKind, JoinKind, Plan, PlanKind};

pub use dialect::Dialect;
use dialect::{ddl_type_name, params};

/// Qualifies a [`ColRef`] with whatever alias its producing subquery was
/// given in the current emission. Single-child nodes always resolve to one
/// alias; joins dispatch on which side the column's origin plan id matches.
type Qualify<'a> = dyn Fn(&ColRef) -> String + 'a;

/// One generator invocation owns one alias counter, reset by [`Self::new`].
/// Not thread-safe; build a fresh instance per emission.
pub struct SqlGenerator {
    dialect: Dialect,
    counter: Cell<u64>,
}

impl SqlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            counter: Cell::new(0),
        }
    }

    /// Emits the full SQL for `plan`: any UDF `CREATE OR REPLACE FUNCTION`
    /// prologue the plan needs, followed by the SELECT (or DDL+SELECT for
    /// an external scan).
    pub fn generate(&self, plan: &Plan) -> Result<String> {
        let udfs = udf::collect_udfs(plan);
        let prologue = udf::emit_prologue(&udfs, self.dialect)?;
        let body = self.emit(plan)?;
        Ok(format!("{prologue}{body}"))
    }

    /// Emits `SELECT EXISTS(SELECT 1 FROM (<plan>) $alias WHERE <predicate>)`,
    /// used by the containment (`in`) executor-boundary sink. `predicate`'s
    /// [`ColRef`]s are resolved against `plan`'s own alias, exactly as a
    /// WHERE-position [`Filter`](crate::plan::PlanKind::Filter) would.
    pub fn generate_exists(&self, plan: &Plan, predicate: &Expr) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(plan)?;
        let qualify = |c: &ColRef| format!("{alias}.{}", c.name);
        let pred_sql = self.emit_expr(predicate, &qualify)?;
        Ok(format!("select exists(select 1 from {from_clause} where {pred_sql})"))
    }

    /// Emits `<prologue>select count(*) from (<plan>) $alias`, used by the
    /// `len`/`shape` executor-boundary sinks.
    pub fn generate_count_star(&self, plan: &Plan) -> Result<String> {
        let udfs = udf::collect_udfs(plan);
        let prologue = udf::emit_prologue(&udfs, self.dialect)?;
        let body = self.emit(plan)?;
        let alias = self.next_alias();
        Ok(format!("{prologue}select count(*) from ({body}) {alias}"))
    }

    fn next_alias(&self) -> String {
        let n = self.counter.get();
        self.counter.set(n + 1);
        format!("$t{n}")
    }

    /// Emits `child`, wraps it in parentheses, and assigns it a fresh
    /// alias. Returns the `(<sql>) $alias` fragment plus the alias, which
    /// the caller uses both as the FROM target and to qualify its own
    /// column references into `child`.
    fn wrap_child(&self, child: &Plan) -> Result<(String, String)> {
        let child_sql = self.emit(child)?;
        let alias = self.next_alias();
        Ok((format!("({child_sql}) {alias}"), alias))
    }

    fn emit(&self, plan: &Plan) -> Result<String> {
        debug_print::debug_println!("emitting plan node {}", plan.id);
        match &plan.kind {
            PlanKind::Scan { table } => {
                let alias = self.next_alias();
                Ok(format!("select * from {table} {alias}"))
            }
            PlanKind::ExternalScan {
                path,
                columns,
                header,
                delim,
                format,
            } => self.emit_external_scan(path, columns, *header, *delim, format),
            PlanKind::Projection { child, items } => self.emit_projection(child, items),
            PlanKind::Filter {
                kind: FilterKind::Where,
                child,
                predicate,
            } => self.emit_filter_where(child, predicate),
            PlanKind::Filter {
                kind: FilterKind::Having,
                ..
            } => {
                let (agg_node, having) = collect_having(plan);
                self.emit_aggregation(agg_node, having)
            }
            PlanKind::GroupBy { child, keys } => self.emit_group_by(child, keys),
            PlanKind::Aggregation { .. } => self.emit_aggregation(plan, None),
            PlanKind::Join {
                left,
                right,
                condition,
                kind,
            } => self.emit_join(left, right, condition.as_ref(), *kind),
            PlanKind::Distinct { child } => self.emit_distinct(child),
            PlanKind::Sort { child, keys } => self.emit_sort(child, keys),
            PlanKind::Limit {
                child,
                limit,
                offset,
            } => self.emit_limit(child, *limit, *offset),
            PlanKind::SetOp { children } => self.emit_set_op(children),
            PlanKind::Describe { child } => self.emit_describe(child),
        }
    }

    fn emit_external_scan(
        &self,
        path: &str,
        columns: &[(String, crate::schema::ColSpec)],
        header: bool,
        delim: Option<char>,
        format: &str,
    ) -> Result<String> {
        let dialect_params = params(self.dialect);
        if !dialect_params.supports_external_table {
            return Err(GrizzlyError::value(format!(
                "dialect '{}' does not support external tables",
                self.dialect.name()
            )));
        }
        let alias = self.next_alias();
        let cols_ddl = columns
            .iter()
            .map(|(name, spec)| format!("{name} {}", ddl_type_name(*spec, dialect_params)))
            .collect::<Vec<_>>()
            .join(", ");
        let delim_used = delim.unwrap_or('|');
        let options = if header {
            format!("'delimiter'='{delim_used}'")
        } else {
            format!("'delimiter'='{delim_used}','header'='false','schema'='{cols_ddl}'")
        };
        Ok(format!(
            "drop table if exists temp_ext_table{alias}; \
             create external table temp_ext_table{alias}({cols_ddl}) \
             using spark with reference='{path}', format='{format}', options=({options}) \
             select * from temp_ext_table{alias} {alias}"
        ))
    }

    fn emit_projection(&self, child: &Plan, items: &[crate::plan::ProjectItem]) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(child)?;
        let is_pure_passthrough = items.len() == child.schema.len()
            && items
                .iter()
                .zip(child.schema.names())
                .all(|(item, name)| item.is_passthrough() && item.name == name);
        if is_pure_passthrough {
            return Ok(format!("select * from {from_clause}"));
        }
        let qualify = |c: &ColRef| format!("{alias}.{}", c.name);
        let cols = items
            .iter()
            .map(|item| {
                if item.is_passthrough() {
                    Ok(qualify(&ColRef::new(item.name.clone(), 0)))
                } else {
                    let expr_sql = self.emit_expr(&item.expr, &qualify)?;
                    Ok(format!("{expr_sql} as {}", item.name))
                }
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        Ok(format!("select {cols} from {from_clause}"))
    }

    fn emit_filter_where(&self, child: &Plan, predicate: &Expr) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(child)?;
        let qualify = |c: &ColRef| format!("{alias}.{}", c.name);
        let pred_sql = self.emit_expr(predicate, &qualify)?;
        Ok(format!("select * from {from_clause} where {pred_sql}"))
    }

    fn emit_group_by(&self, child: &Plan, keys: &[ColRef]) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(child)?;
        let key_list = keys
            .iter()
            .map(|k| format!("{alias}.{}", k.name))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("select {key_list} from {from_clause} group by {key_list}"))
    }

    /// Emits an `Aggregation` node. `extra_having`, when present, is an
    /// already-AND-merged predicate contributed by a chain of HAVING
    /// filters sitting directly above this node.
    fn emit_aggregation(&self, agg_plan: &Plan, extra_having: Option<Expr>) -> Result<String> {
        let PlanKind::Aggregation {
            child,
            aggs,
            group_keys,
        } = &agg_plan.kind
        else {
            unreachable!("emit_aggregation called on a non-Aggregation plan")
        };
        let (from_clause, alias) = self.wrap_child(child)?;
        let qualify = |c: &ColRef| format!("{alias}.{}", c.name);

        let mut select_items = Vec::new();
        if let Some(keys) = group_keys {
            for k in keys {
                select_items.push(format!("{alias}.{}", k.name));
            }
        }
        for agg in aggs {
            select_items.push(self.emit_expr(agg, &qualify)?);
        }

        let mut sql = format!("select {} from {from_clause}", select_items.join(", "));
        if let Some(keys) = group_keys {
            if !keys.is_empty() {
                let key_list = keys
                    .iter()
                    .map(|k| format!("{alias}.{}", k.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(sql, " group by {key_list}").expect("writing to String never fails");
            }
        }
        if let Some(pred) = extra_having {
            // A HAVING predicate references the aggregation's own output
            // aliases (e.g. `cnt` in `.filter(cnt > 2)`), not a column of
            // the wrapped child subquery, so those `ColRef`s render bare
            // rather than qualified by `alias`.
            let having_qualify = |c: &ColRef| {
                if c.origin == agg_plan.id {
                    c.name.clone()
                } else {
                    format!("{alias}.{}", c.name)
                }
            };
            let pred_sql = self.emit_expr(&pred, &having_qualify)?;
            write!(sql, " having {pred_sql}").expect("writing to String never fails");
        }
        Ok(sql)
    }

    fn emit_join(
        &self,
        left: &Plan,
        right: &Plan,
        condition: Option<&Expr>,
        kind: JoinKind,
    ) -> Result<String> {
        let (left_from, left_alias) = self.wrap_child(left)?;
        let (right_from, right_alias) = self.wrap_child(right)?;
        let mut sql = format!(
            "select * from {left_from} {} join {right_from}",
            kind.as_sql()
        );
        if kind != JoinKind::Natural {
            let cond = condition.ok_or_else(|| {
                GrizzlyError::expression("join requires a condition unless natural")
            })?;
            let left_id = left.id;
            let qualify = move |c: &ColRef| {
                if c.origin == left_id {
                    format!("{left_alias}.{}", c.name)
                } else {
                    format!("{right_alias}.{}", c.name)
                }
            };
            let cond_sql = self.emit_expr(cond, &qualify)?;
            write!(sql, " on {cond_sql}").expect("writing to String never fails");
        }
        Ok(sql)
    }

    fn emit_distinct(&self, child: &Plan) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(child)?;
        if child.schema.is_known() {
            let cols = child
                .schema
                .names()
                .map(|n| format!("{alias}.{n}"))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!("select distinct {cols} from {from_clause}"))
        } else {
            Ok(format!("select distinct * from {from_clause}"))
        }
    }

    fn emit_sort(&self, child: &Plan, keys: &[(ColRef, bool)]) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(child)?;
        let uniform = keys.windows(2).all(|w| w[0].1 == w[1].1);
        let order_sql = if uniform {
            let cols = keys
                .iter()
                .map(|(k, _)| format!("{alias}.{}", k.name))
                .collect::<Vec<_>>()
                .join(", ");
            let dir = if keys.first().map(|(_, asc)| *asc).unwrap_or(true) {
                "asc"
            } else {
                "desc"
            };
            format!("{cols} {dir}")
        } else {
            keys.iter()
                .map(|(k, asc)| {
                    format!("{alias}.{} {}", k.name, if *asc { "asc" } else { "desc" })
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        Ok(format!("select * from {from_clause} order by {order_sql}"))
    }

    fn emit_limit(&self, child: &Plan, limit: u64, offset: u64) -> Result<String> {
        let (from_clause, alias) = self.wrap_child(child)?;
        let mut sql = format!("select {alias}.* from {from_clause} limit {limit}");
        if offset > 0 {
            write!(sql, " offset {offset}").expect("writing to String never fails");
        }
        Ok(sql)
    }

    fn emit_set_op(&self, children: &[Rc<Plan>]) -> Result<String> {
        let parts = children
            .iter()
            .map(|c| self.emit(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(" union all "))
    }

    /// Each NUMERIC column in `child`'s schema gets its own UNION ALL
    /// branch, with `child` re-emitted (and re-aliased) independently per
    /// branch rather than shared across them.
    fn emit_describe(&self, child: &Plan) -> Result<String> {
        let numeric_cols: Vec<String> = child
            .schema
            .numeric_columns()
            .into_iter()
            .map(String::from)
            .collect();
        if numeric_cols.is_empty() {
            return Err(GrizzlyError::schema(
                "describe() requires at least one NUMERIC column",
            ));
        }
        let mut branches = Vec::with_capacity(numeric_cols.len());
        for col in &numeric_cols {
            let (from_clause, alias) = self.wrap_child(child)?;
            branches.push(format!(
                "select min({alias}.{col}) as min, max({alias}.{col}) as max, \
                 avg({alias}.{col}) as mean, count({alias}.{col}) as count from {from_clause}"
            ));
        }
        Ok(branches.join(" union all "))
    }

    fn emit_expr(&self, expr: &Expr, qualify: &Qualify<'_>) -> Result<String> {
        match expr {
            Expr::Literal(lit) => Ok(self.emit_literal(lit)),
            Expr::Column(c) => Ok(qualify(c)),
            Expr::Compare { lhs, op, rhs } => self.emit_compare(lhs, *op, rhs, qualify),
            Expr::Logical { lhs, op, rhs } => {
                if !lhs.is_boolean_shaped() || !rhs.is_boolean_shaped() {
                    return Err(GrizzlyError::expression(
                        "logical operator applied to a non-boolean-shaped operand",
                    ));
                }
                let l = self.emit_logical_operand(lhs, qualify)?;
                let r = self.emit_logical_operand(rhs, qualify)?;
                Ok(format!("{l} {} {r}", op.as_sql()))
            }
            Expr::Arith { lhs, op, rhs } => {
                let prec = expr.precedence();
                let l = self.emit_operand(lhs, prec, qualify)?;
                let r = self.emit_operand(rhs, prec, qualify)?;
                Ok(format!("{l} {} {r}", op.as_sql()))
            }
            Expr::Agg { kind, arg, .. } => {
                let arg_sql = match arg {
                    AggArg::Star => "*".to_string(),
                    AggArg::Column(c) => qualify(c),
                };
                Ok(format!("{}({arg_sql})", kind.as_sql_fn()))
            }
            Expr::Udf { def, args, .. } => {
                let arg_sql = args
                    .iter()
                    .map(|a| self.emit_expr(a, qualify))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                Ok(format!("{}({arg_sql})", def.name))
            }
            Expr::In { lhs, list } => {
                let lhs_sql = self.emit_expr(lhs, qualify)?;
                let list_sql = list
                    .iter()
                    .map(|v| self.emit_expr(v, qualify))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                Ok(format!("{lhs_sql} in ({list_sql})"))
            }
        }
    }

    fn emit_operand(&self, expr: &Expr, parent_prec: Precedence, qualify: &Qualify<'_>) -> Result<String> {
        let sql = self.emit_expr(expr, qualify)?;
        if expr.precedence() < parent_prec {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }

    /// A nested `and`/`or` always gets parenthesized under a logical parent,
    /// regardless of which combinator it is, so the rendered SQL mirrors the
    /// grouping the caller wrote rather than relying on AND-before-OR
    /// precedence to make it unambiguous.
    fn emit_logical_operand(&self, expr: &Expr, qualify: &Qualify<'_>) -> Result<String> {
        let sql = self.emit_expr(expr, qualify)?;
        if matches!(expr, Expr::Logical { .. }) {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }

    fn emit_compare(
        &self,
        lhs: &Expr,
        op: CompareOp,
        rhs: &Expr,
        qualify: &Qualify<'_>,
    ) -> Result<String> {
        let rhs_is_null = matches!(rhs, Expr::Literal(Literal::Null));
        let lhs_is_null = matches!(lhs, Expr::Literal(Literal::Null));
        if rhs_is_null || lhs_is_null {
            let operand = if rhs_is_null { lhs } else { rhs };
            return match op {
                CompareOp::Eq => Ok(format!("{} is NULL", self.emit_expr(operand, qualify)?)),
                CompareOp::Ne => Ok(format!("{} is not NULL", self.emit_expr(operand, qualify)?)),
                _ => Err(GrizzlyError::expression(
                    "ordered comparison against NULL is not allowed",
                )),
            };
        }
        let prec = Precedence(3);
        let l = self.emit_operand(lhs, prec, qualify)?;
        let r = self.emit_operand(rhs, prec, qualify)?;
        Ok(format!("{l} {} {r}", op.as_sql()))
    }

    fn emit_literal(&self, lit: &Literal) -> String {
        match lit {
            Literal::Int(v) => v.to_string(),
            Literal::Float(v) => v.to_string(),
            Literal::Str(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Bool(b) => {
                let p = params(self.dialect);
                if *b { p.bool_true } else { p.bool_false }.to_string()
            }
            Literal::Null => "NULL".to_string(),
        }
    }
}

/// Walks down through a chain of HAVING filters to the `Aggregation` they
/// ultimately attach to, AND-merging their predicates in application order
/// (the earliest-applied filter's predicate comes first).
fn collect_having(plan: &Plan) -> (&Plan, Option<Expr>) {
    let mut node = plan;
    let mut preds = Vec::new();
    while let PlanKind::Filter {
        kind: FilterKind::Having,
        child,
        predicate,
    } = &node.kind
    {
        preds.push(predicate.clone());
        node = child.as_ref();
    }
    preds.reverse();
    let merged = preds.into_iter().reduce(|a, b| a.and(b));
    (node, merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{AggKind, Literal};
    use crate::plan::{JoinKind, ProjectItem};
    use crate::schema::{ColSpec, ColType, Schema};

    fn events_schema() -> Schema {
        Schema::from_specs(vec![
            ("globaleventid", ColSpec::Int),
            ("actor1name", ColSpec::Str),
        ])
    }

    fn normalize(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    #[test]
    fn scan_emits_bare_select_star() {
        let scan = Plan::scan("events", events_schema());
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = gen.generate(&scan).unwrap();
        assert_eq!(normalize(&sql), "select * from events $t0");
    }

    #[test]
    fn filter_wraps_child_and_emits_where() {
        let scan = Plan::scan("events", events_schema());
        let pred = Expr::col(ColRef::new("globaleventid", scan.id)).eq(Expr::lit(Literal::Int(468189636)));
        let filter = Plan::filter(scan, pred, FilterKind::Where);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = gen.generate(&filter).unwrap();
        assert_eq!(
            normalize(&sql),
            "select * from (select * from events $t0) $t1 where $t1.globaleventid = 468189636"
        );
    }

    #[test]
    fn eq_none_lowers_to_is_null() {
        let scan = Plan::scan("events", events_schema());
        let pred = Expr::col(ColRef::new("actor1name", scan.id)).eq(Expr::lit(Literal::Null));
        let filter = Plan::filter(scan, pred, FilterKind::Where);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = gen.generate(&filter).unwrap();
        assert!(normalize(&sql).contains("is null"));
    }

    #[test]
    fn lt_none_is_rejected_at_emission() {
        let scan = Plan::scan("events", events_schema());
        let pred = Expr::col(ColRef::new("actor1name", scan.id)).lt(Expr::lit(Literal::Null));
        let filter = Plan::filter(scan, pred, FilterKind::Where);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let result = gen.generate(&filter);
        assert!(matches!(result, Err(GrizzlyError::Expression(_))));
    }

    #[test]
    fn having_chain_merges_with_and_in_application_order() {
        let scan = Plan::scan("events", events_schema());
        let group = Plan::group_by(scan.clone(), vec![ColRef::new("actor1name", scan.id)]);
        let cnt_alias = "cnt_actor";
        let agg = Plan::aggregation(
            scan.clone(),
            vec![Expr::Agg {
                kind: AggKind::Count,
                arg: AggArg::Column(ColRef::new("globaleventid", scan.id)),
                alias: Some(cnt_alias.into()),
            }],
            Some(vec![ColRef::new("actor1name", scan.id)]),
        )
        .unwrap();
        let _ = group;
        let having1 = Plan::filter(
            agg.clone(),
            Expr::col(ColRef::new(cnt_alias, agg.id)).gt(Expr::lit(Literal::Int(2))),
            FilterKind::Having,
        );
        let having2 = Plan::filter(
            having1.clone(),
            Expr::col(ColRef::new(cnt_alias, agg.id)).lt(Expr::lit(Literal::Int(100))),
            FilterKind::Having,
        );
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = normalize(&gen.generate(&having2).unwrap());
        let gt_pos = sql.find("cnt_actor > 2").unwrap();
        let lt_pos = sql.find("cnt_actor < 100").unwrap();
        assert!(gt_pos < lt_pos, "predicates must merge in application order: {sql}");
        assert!(sql.contains(" and "));
        assert!(
            sql.contains("having cnt_actor > 2 and cnt_actor < 100"),
            "HAVING must reference the aggregate's output alias bare, not qualified by the child subquery alias: {sql}"
        );
    }

    #[test]
    fn join_qualifies_each_side_by_its_own_alias() {
        let left = Plan::scan("b1", events_schema());
        let right = Plan::scan("b2", events_schema());
        let cond = Expr::col(ColRef::new("globaleventid", left.id))
            .eq(Expr::col(ColRef::new("globaleventid", right.id)));
        let join = Plan::join(left, right, Some(cond), JoinKind::Inner);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = normalize(&gen.generate(&join).unwrap());
        assert!(sql.contains("inner join"));
        assert!(sql.contains(" on "));
    }

    #[test]
    fn distinct_with_known_schema_qualifies_every_column() {
        let scan = Plan::scan("events", events_schema());
        let items = vec![ProjectItem::passthrough(ColRef::new("actor1name", scan.id))];
        let proj = Plan::projection(scan, items);
        let distinct = Plan::distinct(proj);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = normalize(&gen.generate(&distinct).unwrap());
        assert!(sql.contains("select distinct"));
        assert!(sql.contains(".actor1name"));
    }

    #[test]
    fn limit_without_offset_omits_offset_clause() {
        let scan = Plan::scan("events", events_schema());
        let limited = Plan::limit(scan, 10, 0);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = normalize(&gen.generate(&limited).unwrap());
        assert!(sql.contains("limit 10"));
        assert!(!sql.contains("offset"));
    }

    #[test]
    fn limit_with_offset_renders_both() {
        let scan = Plan::scan("events", events_schema());
        let limited = Plan::limit(scan, 10, 5);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = normalize(&gen.generate(&limited).unwrap());
        assert!(sql.contains("limit 10"));
        assert!(sql.contains("offset 5"));
    }

    #[test]
    fn describe_unions_one_branch_per_numeric_column() {
        let schema = Schema::from_specs(vec![
            ("a", ColSpec::Int),
            ("b", ColSpec::Str),
            ("c", ColSpec::Float),
        ]);
        let scan = Plan::scan("t", schema);
        let described = Plan::describe(scan);
        let gen = SqlGenerator::new(Dialect::Sqlite);
        let sql = normalize(&gen.generate(&described).unwrap());
        assert_eq!(sql.matches("union all").count(), 1);
        assert!(sql.contains(".a)"));
        assert!(sql.contains(".c)"));
        assert!(!sql.contains(".b)"));
    }

    #[test]
    fn udf_prologue_precedes_select_and_appears_once() {
        use crate::udf::{TypeTag, UdfDef};
        let def = Rc::new(UdfDef::new(
            "myfunc",
            vec![("a", TypeTag::Int)],
            TypeTag::Str,
            "return a",
        ));
        let scan = Plan::scan("events", events_schema());
        let item = crate::plan::ProjectItem::computed(
            "newid",
            Expr::Udf {
                def: def.clone(),
                args: vec![Expr::col(ColRef::new("globaleventid", scan.id))],
                alias: None,
            },
        );
        let proj = Plan::projection(scan, vec![item]);
        let gen = SqlGenerator::new(Dialect::Postgresql);
        let sql = gen.generate(&proj).unwrap();
        assert_eq!(sql.matches("create or replace function").count(), 1);
        let prologue_pos = sql.find("create or replace function").unwrap();
        let select_pos = sql.find("select").unwrap();
        assert!(prologue_pos < select_pos);
        assert!(sql.to_lowercase() == normalize(&sql));
        let _ = ColType::Numeric;
    }

    #[test]
    fn external_scan_emits_ddl_and_reuses_alias() {
        let scan = Plan::external_scan(
            "filename.csv",
            vec![("a", ColSpec::Int), ("b", ColSpec::Str), ("c", ColSpec::Float)],
            false,
            None,
            "csv",
        );
        let gen = SqlGenerator::new(Dialect::Vector);
        let sql = normalize(&gen.generate(&scan).unwrap());
        assert!(sql.contains("drop table if exists temp_ext_table$t0"));
        assert!(sql.contains("select * from temp_ext_table$t0 $t0"));
        assert!(sql.contains("'header'='false'"));
    }

    #[test]
    fn external_scan_rejected_on_dialect_without_support() {
        let scan = Plan::external_scan(
            "filename.csv",
            vec![("a", ColSpec::Int)],
            true,
            None,
            "csv",
        );
        let gen = SqlGenerator::new(Dialect::Sqlite);
        assert!(gen.generate(&scan).is_err());
    }
}
