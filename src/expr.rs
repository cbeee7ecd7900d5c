//! The expression intermediate representation: the tagged tree used for
//! filter predicates, projection items, join conditions, group keys, order
//! keys, and computed columns.

use std::rc::Rc;

use crate::udf::UdfDef;

/// A back-reference to the plan node that produces a column, so two
/// [`ColRef`]s compare equal only when both the name and the producing node
/// agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColRef {
    pub name: String,
    pub origin: u64,
}

impl ColRef {
    pub fn new(name: impl Into<String>, origin: u64) -> Self {
        Self {
            name: name.into(),
            origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggKind {
    Count,
    Min,
    Max,
    Sum,
    Mean,
}

impl AggKind {
    pub fn as_sql_fn(self) -> &'static str {
        match self {
            AggKind::Count => "count",
            AggKind::Min => "min",
            AggKind::Max => "max",
            AggKind::Sum => "sum",
            AggKind::Mean => "avg",
        }
    }

    /// Display name used as the default column alias in whole-dataframe
    /// aggregation tuple tables (e.g. `df.max()`).
    pub fn as_label(self) -> &'static str {
        match self {
            AggKind::Count => "count",
            AggKind::Min => "min",
            AggKind::Max => "max",
            AggKind::Sum => "sum",
            AggKind::Mean => "mean",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggArg {
    Column(ColRef),
    Star,
}

/// The expression tree. Immutable once constructed; sub-expressions
/// reference [`ColRef`]s whose origin must be an ancestor of the plan node
/// the expression is attached to (checked by the facade, not here).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Column(ColRef),
    Compare {
        lhs: Box<Expr>,
        op: CompareOp,
        rhs: Box<Expr>,
    },
    Logical {
        lhs: Box<Expr>,
        op: LogicalOp,
        rhs: Box<Expr>,
    },
    Arith {
        lhs: Box<Expr>,
        op: ArithOp,
        rhs: Box<Expr>,
    },
    Agg {
        kind: AggKind,
        arg: AggArg,
        alias: Option<String>,
    },
    Udf {
        def: Rc<UdfDef>,
        args: Vec<Expr>,
        alias: Option<String>,
    },
    /// `lhs IN (v1, v2, ...)`, used by `loc[[...]]` when a list of index
    /// values is given rather than a single scalar.
    In {
        lhs: Box<Expr>,
        list: Vec<Expr>,
    },
}

/// Binding power used to decide when the generator must re-parenthesize a
/// child expression: AND binds tighter than OR. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precedence(pub u8);

impl Expr {
    pub fn lit(value: Literal) -> Expr {
        Expr::Literal(value)
    }

    pub fn col(r: ColRef) -> Expr {
        Expr::Column(r)
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Expr::Agg { alias, .. } | Expr::Udf { alias, .. } => alias.as_deref(),
            _ => None,
        }
    }

    pub fn with_alias(self, alias: impl Into<String>) -> Expr {
        let alias = Some(alias.into());
        match self {
            Expr::Agg { kind, arg, .. } => Expr::Agg { kind, arg, alias },
            Expr::Udf { def, args, .. } => Expr::Udf { def, args, alias },
            other => other,
        }
    }

    fn binary_compare(self, op: CompareOp, rhs: Expr) -> Expr {
        Expr::Compare {
            lhs: Box::new(self),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(self, rhs: Expr) -> Expr {
        self.binary_compare(CompareOp::Eq, rhs)
    }

    pub fn ne(self, rhs: Expr) -> Expr {
        self.binary_compare(CompareOp::Ne, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Expr {
        self.binary_compare(CompareOp::Lt, rhs)
    }

    pub fn le(self, rhs: Expr) -> Expr {
        self.binary_compare(CompareOp::Le, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Expr {
        self.binary_compare(CompareOp::Gt, rhs)
    }

    pub fn ge(self, rhs: Expr) -> Expr {
        self.binary_compare(CompareOp::Ge, rhs)
    }

    pub fn and(self, rhs: Expr) -> Expr {
        Expr::Logical {
            lhs: Box::new(self),
            op: LogicalOp::And,
            rhs: Box::new(rhs),
        }
    }

    pub fn or(self, rhs: Expr) -> Expr {
        Expr::Logical {
            lhs: Box::new(self),
            op: LogicalOp::Or,
            rhs: Box::new(rhs),
        }
    }

    pub fn is_in(self, list: Vec<Expr>) -> Expr {
        Expr::In {
            lhs: Box::new(self),
            list,
        }
    }

    fn binary_arith(self, op: ArithOp, rhs: Expr) -> Expr {
        Expr::Arith {
            lhs: Box::new(self),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn add(self, rhs: Expr) -> Expr {
        self.binary_arith(ArithOp::Add, rhs)
    }

    pub fn sub(self, rhs: Expr) -> Expr {
        self.binary_arith(ArithOp::Sub, rhs)
    }

    pub fn mul(self, rhs: Expr) -> Expr {
        self.binary_arith(ArithOp::Mul, rhs)
    }

    pub fn div(self, rhs: Expr) -> Expr {
        self.binary_arith(ArithOp::Div, rhs)
    }

    /// Binding power of this expression's top-level operator. Atoms
    /// (literals, column refs, aggregate/UDF calls) are treated as the
    /// tightest-binding "parenthesization never needed" level.
    pub fn precedence(&self) -> Precedence {
        match self {
            Expr::Logical {
                op: LogicalOp::Or, ..
            } => Precedence(1),
            Expr::Logical {
                op: LogicalOp::And, ..
            } => Precedence(2),
            Expr::Compare { .. } | Expr::In { .. } => Precedence(3),
            Expr::Arith {
                op: ArithOp::Add | ArithOp::Sub,
                ..
            } => Precedence(4),
            Expr::Arith {
                op: ArithOp::Mul | ArithOp::Div,
                ..
            } => Precedence(5),
            Expr::Literal(_) | Expr::Column(_) | Expr::Agg { .. } | Expr::Udf { .. } => {
                Precedence(u8::MAX)
            }
        }
    }

    /// Used by the generator to reject `AND`/`OR` combinations whose operand
    /// is obviously not boolean-shaped. Column references are trusted since
    /// this IR has no dedicated boolean `ColType`.
    pub fn is_boolean_shaped(&self) -> bool {
        !matches!(self, Expr::Arith { .. } | Expr::Agg { .. })
    }

    /// Whether this is a bare literal `NULL`, used by the generator to
    /// decide when a `Compare` must rewrite to `IS [NOT] NULL`.
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Null))
    }

    /// Every [`ColRef`] transitively referenced by this expression.
    pub fn column_refs(&self) -> Vec<&ColRef> {
        let mut out = Vec::new();
        self.collect_column_refs(&mut out);
        out
    }

    fn collect_column_refs<'a>(&'a self, out: &mut Vec<&'a ColRef>) {
        match self {
            Expr::Column(c) => out.push(c),
            Expr::Literal(_) => {}
            Expr::Compare { lhs, rhs, .. }
            | Expr::Logical { lhs, rhs, .. }
            | Expr::Arith { lhs, rhs, .. } => {
                lhs.collect_column_refs(out);
                rhs.collect_column_refs(out);
            }
            Expr::Agg { arg, .. } => {
                if let AggArg::Column(c) = arg {
                    out.push(c);
                }
            }
            Expr::Udf { args, .. } => {
                for a in args {
                    a.collect_column_refs(out);
                }
            }
            Expr::In { lhs, list } => {
                lhs.collect_column_refs(out);
                for a in list {
                    a.collect_column_refs(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Expr {
        Expr::Column(ColRef::new(name, 0))
    }

    #[test]
    fn precedence_or_is_loosest() {
        let and_expr = col("a").eq(col("b")).and(col("c").eq(col("d")));
        let or_expr = col("a").eq(col("b")).or(col("c").eq(col("d")));
        assert!(or_expr.precedence() < and_expr.precedence());
    }

    #[test]
    fn arith_binds_tighter_than_compare() {
        let arith = col("a").add(col("b"));
        let compare = col("a").eq(col("b"));
        assert!(compare.precedence() < arith.precedence());
    }

    #[test]
    fn column_refs_collects_from_both_sides() {
        let expr = col("a").eq(col("b")).and(col("c").lt(Expr::lit(Literal::Int(3))));
        let refs: Vec<_> = expr.column_refs().iter().map(|c| c.name.clone()).collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
    }
}
