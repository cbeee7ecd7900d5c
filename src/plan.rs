//! The logical plan: an immutable tree of relational operators. Every node
//! knows its children, its schema (computed eagerly at construction), and
//! any operator-specific auxiliary state.

use std::sync::atomic::{AtomicU64, Ordering};

use std::rc::Rc;

use crate::error::{GrizzlyError, Result};
use crate::expr::{AggArg, AggKind, ColRef, Expr, Literal};
use crate::schema::{ColSpec, ColType, Schema};
use crate::udf::TypeTag;

static NEXT_PLAN_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    NEXT_PLAN_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Where,
    Having,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Natural,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::LeftOuter => "left outer",
            JoinKind::RightOuter => "right outer",
            JoinKind::FullOuter => "full outer",
            JoinKind::Natural => "natural",
        }
    }
}

/// One item of a [`PlanKind::Projection`]: a named output column, either a
/// passthrough of an input column (`expr` is `Expr::Column` whose name
/// equals `name`) or a computed column (anything else), which the generator
/// renders with an explicit `AS name`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    pub name: String,
    pub expr: Expr,
}

impl ProjectItem {
    pub fn passthrough(col: ColRef) -> Self {
        Self {
            name: col.name.clone(),
            expr: Expr::Column(col),
        }
    }

    pub fn computed(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }

    /// A plain passthrough renders as `$alias.col`, everything else needs an
    /// explicit `AS`.
    pub fn is_passthrough(&self) -> bool {
        matches!(&self.expr, Expr::Column(c) if c.name == self.name)
    }
}

#[derive(Debug)]
pub enum PlanKind {
    Scan {
        table: String,
    },
    ExternalScan {
        path: String,
        /// Column declarations in source order, kept at host-type
        /// granularity (int vs float) since the DDL prologue spells those
        /// differently even though both collapse to `ColType::Numeric`.
        columns: Vec<(String, ColSpec)>,
        header: bool,
        delim: Option<char>,
        format: String,
    },
    Projection {
        child: Rc<Plan>,
        items: Vec<ProjectItem>,
    },
    Filter {
        child: Rc<Plan>,
        predicate: Expr,
        kind: FilterKind,
    },
    GroupBy {
        child: Rc<Plan>,
        keys: Vec<ColRef>,
    },
    Aggregation {
        child: Rc<Plan>,
        aggs: Vec<Expr>,
        group_keys: Option<Vec<ColRef>>,
    },
    Join {
        left: Rc<Plan>,
        right: Rc<Plan>,
        condition: Option<Expr>,
        kind: JoinKind,
    },
    Distinct {
        child: Rc<Plan>,
    },
    Sort {
        child: Rc<Plan>,
        keys: Vec<(ColRef, bool)>,
    },
    Limit {
        child: Rc<Plan>,
        limit: u64,
        offset: u64,
    },
    /// UNION ALL is the only supported set operation.
    SetOp {
        children: Vec<Rc<Plan>>,
    },
    Describe {
        child: Rc<Plan>,
    },
}

#[derive(Debug)]
pub struct Plan {
    pub id: u64,
    pub schema: Schema,
    pub kind: PlanKind,
}

fn infer_expr_type(expr: &Expr, schema: &Schema) -> ColType {
    match expr {
        Expr::Literal(Literal::Int(_)) | Expr::Literal(Literal::Float(_)) => ColType::Numeric,
        Expr::Literal(Literal::Str(_)) | Expr::Literal(Literal::Bool(_)) => ColType::Text,
        Expr::Literal(Literal::Null) => ColType::Text,
        Expr::Column(c) => schema.get(&c.name).unwrap_or(ColType::Text),
        Expr::Arith { lhs, rhs, .. } => {
            let l = infer_expr_type(lhs, schema);
            let r = infer_expr_type(rhs, schema);
            if l == ColType::Numeric && r == ColType::Numeric {
                ColType::Numeric
            } else {
                ColType::Text
            }
        }
        Expr::Compare { .. } | Expr::Logical { .. } | Expr::In { .. } => ColType::Text,
        Expr::Agg { kind, arg, .. } => match kind {
            AggKind::Count => ColType::Numeric,
            AggKind::Sum | AggKind::Mean => ColType::Numeric,
            AggKind::Min | AggKind::Max => match arg {
                AggArg::Column(c) => schema.get(&c.name).unwrap_or(ColType::Numeric),
                AggArg::Star => ColType::Numeric,
            },
        },
        Expr::Udf { def, .. } => match def.return_type {
            TypeTag::Int | TypeTag::Float => ColType::Numeric,
            TypeTag::Str | TypeTag::Bool | TypeTag::Any => ColType::Text,
        },
    }
}

impl Plan {
    fn new(schema: Schema, kind: PlanKind) -> Rc<Plan> {
        Rc::new(Plan {
            id: next_id(),
            schema,
            kind,
        })
    }

    pub fn scan(table: impl Into<String>, schema: Schema) -> Rc<Plan> {
        Plan::new(schema, PlanKind::Scan { table: table.into() })
    }

    pub fn external_scan(
        path: impl Into<String>,
        columns: Vec<(impl Into<String>, ColSpec)>,
        header: bool,
        delim: Option<char>,
        format: impl Into<String>,
    ) -> Rc<Plan> {
        let columns: Vec<(String, ColSpec)> = columns.into_iter().map(|(n, s)| (n.into(), s)).collect();
        let schema = Schema::new(columns.iter().map(|(n, s)| (n.clone(), ColType::from(*s))).collect());
        Plan::new(
            schema,
            PlanKind::ExternalScan {
                path: path.into(),
                columns,
                header,
                delim,
                format: format.into(),
            },
        )
    }

    pub fn projection(child: Rc<Plan>, items: Vec<ProjectItem>) -> Rc<Plan> {
        let mut schema = Schema::default();
        for item in &items {
            let ty = infer_expr_type(&item.expr, &child.schema);
            schema.push(item.name.clone(), ty);
        }
        Plan::new(schema, PlanKind::Projection { child, items })
    }

    pub fn filter(child: Rc<Plan>, predicate: Expr, kind: FilterKind) -> Rc<Plan> {
        let schema = child.schema.clone();
        Plan::new(schema, PlanKind::Filter { child, predicate, kind })
    }

    pub fn group_by(child: Rc<Plan>, keys: Vec<ColRef>) -> Rc<Plan> {
        let schema = Schema::new(
            keys.iter()
                .map(|k| (k.name.clone(), child.schema.get(&k.name).unwrap_or(ColType::Text)))
                .collect(),
        );
        Plan::new(schema, PlanKind::GroupBy { child, keys })
    }

    /// Builds an `Aggregation` node, validating each aggregate against
    /// `child`'s schema: rejects an aggregate whose column is absent, or a
    /// SUM/MEAN over a TEXT column. No check is performed when the child's
    /// schema is unknown.
    pub fn aggregation(
        child: Rc<Plan>,
        aggs: Vec<Expr>,
        group_keys: Option<Vec<ColRef>>,
    ) -> Result<Rc<Plan>> {
        if child.schema.is_known() {
            for agg in &aggs {
                if let Expr::Agg { kind, arg, .. } = agg {
                    if let AggArg::Column(c) = arg {
                        let ty = child.schema.get(&c.name).ok_or_else(|| {
                            GrizzlyError::schema(format!(
                                "column '{}' not found in schema",
                                c.name
                            ))
                        })?;
                        if matches!(kind, AggKind::Sum | AggKind::Mean) && ty != ColType::Numeric {
                            return Err(GrizzlyError::schema(format!(
                                "{:?} cannot be applied to TEXT column '{}'",
                                kind, c.name
                            )));
                        }
                    }
                }
            }
        }

        let mut schema = Schema::default();
        if let Some(keys) = &group_keys {
            for k in keys {
                schema.push(
                    k.name.clone(),
                    child.schema.get(&k.name).unwrap_or(ColType::Text),
                );
            }
        }
        for agg in &aggs {
            if let Expr::Agg { kind, arg, alias } = agg {
                let name = alias.clone().unwrap_or_else(|| kind.as_label().to_string());
                let ty = infer_expr_type(&Expr::Agg {
                    kind: *kind,
                    arg: arg.clone(),
                    alias: alias.clone(),
                }, &child.schema);
                schema.push(name, ty);
            }
        }

        Ok(Plan::new(
            schema,
            PlanKind::Aggregation {
                child,
                aggs,
                group_keys,
            },
        ))
    }

    pub fn join(
        left: Rc<Plan>,
        right: Rc<Plan>,
        condition: Option<Expr>,
        kind: JoinKind,
    ) -> Rc<Plan> {
        let schema = left.schema.concat(&right.schema);
        Plan::new(
            schema,
            PlanKind::Join {
                left,
                right,
                condition,
                kind,
            },
        )
    }

    pub fn distinct(child: Rc<Plan>) -> Rc<Plan> {
        let schema = child.schema.clone();
        Plan::new(schema, PlanKind::Distinct { child })
    }

    pub fn sort(child: Rc<Plan>, keys: Vec<(ColRef, bool)>) -> Rc<Plan> {
        let schema = child.schema.clone();
        Plan::new(schema, PlanKind::Sort { child, keys })
    }

    pub fn limit(child: Rc<Plan>, limit: u64, offset: u64) -> Rc<Plan> {
        let schema = child.schema.clone();
        Plan::new(schema, PlanKind::Limit { child, limit, offset })
    }

    pub fn set_op(children: Vec<Rc<Plan>>) -> Rc<Plan> {
        let schema = children
            .first()
            .map(|c| c.schema.clone())
            .unwrap_or_default();
        Plan::new(schema, PlanKind::SetOp { children })
    }

    /// `describe()` reports `(min, max, mean, count)` for each NUMERIC
    /// column in `child`'s schema, one UNION ALL branch per column.
    pub fn describe(child: Rc<Plan>) -> Rc<Plan> {
        let schema = Schema::new(vec![
            ("min".into(), ColType::Numeric),
            ("max".into(), ColType::Numeric),
            ("mean".into(), ColType::Numeric),
            ("count".into(), ColType::Numeric),
        ]);
        Plan::new(schema, PlanKind::Describe { child })
    }
}
