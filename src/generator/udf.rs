//! UDF `CREATE OR REPLACE FUNCTION` prologue emission.

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{GrizzlyError, Result};
use crate::expr::Expr;
use crate::plan::{Plan, PlanKind};
use crate::udf::UdfDef;

use super::dialect::{params, Dialect};

/// Every distinct UDF referenced anywhere in `plan`, in first-occurrence
/// order (pre-order over the tree, left-to-right over each node's
/// sub-expressions).
pub fn collect_udfs(plan: &Plan) -> Vec<Rc<UdfDef>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_from_plan(plan, &mut seen, &mut out);
    out
}

fn collect_from_plan(plan: &Plan, seen: &mut HashSet<String>, out: &mut Vec<Rc<UdfDef>>) {
    match &plan.kind {
        PlanKind::Scan { .. } | PlanKind::ExternalScan { .. } => {}
        PlanKind::Projection { child, items } => {
            collect_from_plan(child, seen, out);
            for item in items {
                collect_from_expr(&item.expr, seen, out);
            }
        }
        PlanKind::Filter {
            child, predicate, ..
        } => {
            collect_from_plan(child, seen, out);
            collect_from_expr(predicate, seen, out);
        }
        PlanKind::GroupBy { child, .. } => collect_from_plan(child, seen, out),
        PlanKind::Aggregation { child, aggs, .. } => {
            collect_from_plan(child, seen, out);
            for agg in aggs {
                collect_from_expr(agg, seen, out);
            }
        }
        PlanKind::Join {
            left,
            right,
            condition,
            ..
        } => {
            collect_from_plan(left, seen, out);
            collect_from_plan(right, seen, out);
            if let Some(c) = condition {
                collect_from_expr(c, seen, out);
            }
        }
        PlanKind::Distinct { child }
        | PlanKind::Sort { child, .. }
        | PlanKind::Limit { child, .. }
        | PlanKind::Describe { child } => {
            collect_from_plan(child, seen, out);
        }
        PlanKind::SetOp { children } => {
            for c in children {
                collect_from_plan(c, seen, out);
            }
        }
    }
}

fn collect_from_expr(expr: &Expr, seen: &mut HashSet<String>, out: &mut Vec<Rc<UdfDef>>) {
    match expr {
        Expr::Udf { def, args, .. } => {
            if seen.insert(def.name.clone()) {
                out.push(def.clone());
            }
            for a in args {
                collect_from_expr(a, seen, out);
            }
        }
        Expr::Compare { lhs, rhs, .. }
        | Expr::Logical { lhs, rhs, .. }
        | Expr::Arith { lhs, rhs, .. } => {
            collect_from_expr(lhs, seen, out);
            collect_from_expr(rhs, seen, out);
        }
        Expr::In { lhs, list } => {
            collect_from_expr(lhs, seen, out);
            for v in list {
                collect_from_expr(v, seen, out);
            }
        }
        Expr::Literal(_) | Expr::Column(_) | Expr::Agg { .. } => {}
    }
}

/// Renders the `CREATE OR REPLACE FUNCTION ...;` prologue for `defs`, one
/// statement per UDF, separated by `;` with a trailing `;` before whatever
/// follows. Returns an empty string when `defs` is empty.
pub fn emit_prologue(defs: &[Rc<UdfDef>], dialect: Dialect) -> Result<String> {
    if defs.is_empty() {
        return Ok(String::new());
    }
    let dialect_params = params(dialect);
    let language = dialect_params.udf_language.ok_or_else(|| {
        GrizzlyError::value(format!(
            "dialect '{}' has no UDF language tag",
            dialect.name()
        ))
    })?;

    let mut statements = Vec::with_capacity(defs.len());
    for def in defs {
        let param_list = def
            .params
            .iter()
            .map(|(name, tag)| {
                let sql_ty = tag.sql_name().ok_or_else(|| {
                    GrizzlyError::value(format!(
                        "UDF '{}' parameter '{}' has no SQL type mapping",
                        def.name, name
                    ))
                })?;
                Ok(format!("{name} {sql_ty}"))
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let return_ty = def.return_type.sql_name().ok_or_else(|| {
            GrizzlyError::value(format!(
                "UDF '{}' return type has no SQL type mapping",
                def.name
            ))
        })?;
        statements.push(format!(
            "CREATE OR REPLACE FUNCTION {}({}) RETURNS {} AS $$ {} $$ LANGUAGE {};",
            def.name,
            param_list,
            return_ty,
            def.body.trim(),
            language
        ));
    }
    Ok(statements.join(""))
}
