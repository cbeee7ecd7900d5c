//! UDF-specific scenarios: dedup across repeated references, dialects with
//! no UDF language tag, and `Any`-typed parameters the generator can't map
//! to a SQL type.

mod common;

use common::normalize;
use grizzly::{ColSpec, Dialect, GrizzlyError, Schema, SqlGenerator, TypeTag, UdfDef};
use std::rc::Rc;

fn base_df() -> grizzly::DataFrame {
    grizzly::DataFrame::read_table(
        "events",
        Some(Schema::from_specs(vec![("a", ColSpec::Int), ("b", ColSpec::Int)])),
    )
}

#[test]
fn same_function_applied_twice_emits_one_prologue() {
    let def = Rc::new(UdfDef::new("double_it", vec![("x", TypeTag::Int)], TypeTag::Int, "return x * 2"));
    let mut df = base_df();
    df.map_column("a", def.clone(), "a2").unwrap();
    df.map_column("b", def, "b2").unwrap();
    let sql = SqlGenerator::new(Dialect::Postgresql).generate(df.plan()).unwrap();
    assert_eq!(sql.matches("CREATE OR REPLACE FUNCTION double_it").count(), 1);
    let normalized = normalize(&sql);
    assert!(normalized.contains("double_it($t1.a) as a2"));
    assert!(normalized.contains("double_it($t1.b) as b2"));
}

#[test]
fn distinct_functions_each_get_their_own_prologue_statement() {
    let first = Rc::new(UdfDef::new("f_one", vec![("x", TypeTag::Int)], TypeTag::Int, "return x + 1"));
    let second = Rc::new(UdfDef::new("f_two", vec![("x", TypeTag::Int)], TypeTag::Int, "return x - 1"));
    let mut df = base_df();
    df.map_column("a", first, "a1").unwrap();
    df.map_column("b", second, "b1").unwrap();
    let sql = SqlGenerator::new(Dialect::Postgresql).generate(df.plan()).unwrap();
    assert!(sql.contains("CREATE OR REPLACE FUNCTION f_one"));
    assert!(sql.contains("CREATE OR REPLACE FUNCTION f_two"));
}

#[test]
fn udf_on_a_dialect_without_a_language_tag_is_rejected() {
    let def = Rc::new(UdfDef::new("f", vec![("x", TypeTag::Int)], TypeTag::Int, "return x"));
    let mut df = base_df();
    df.map_column("a", def, "a1").unwrap();
    let err = SqlGenerator::new(Dialect::Sqlite).generate(df.plan()).unwrap_err();
    assert!(matches!(err, GrizzlyError::Value(_)));
}

#[test]
fn any_typed_parameter_has_no_sql_mapping() {
    let def = Rc::new(UdfDef::new("f", vec![("x", TypeTag::Any)], TypeTag::Int, "return x"));
    let mut df = base_df();
    df.map_column("a", def, "a1").unwrap();
    let err = SqlGenerator::new(Dialect::Postgresql).generate(df.plan()).unwrap_err();
    assert!(matches!(err, GrizzlyError::Value(_)));
}

#[test]
fn udf_referenced_only_inside_a_filter_predicate_is_still_collected() {
    let def = Rc::new(UdfDef::new("is_even", vec![("x", TypeTag::Int)], TypeTag::Bool, "return x % 2 == 0"));
    let df = base_df();
    let col = df.col("a").unwrap();
    let predicate = col.map(def).eq(grizzly::Expr::lit(grizzly::Literal::Bool(true)));
    let filtered = df.filter(predicate);
    let sql = SqlGenerator::new(Dialect::Postgresql).generate(filtered.plan()).unwrap();
    assert!(sql.contains("CREATE OR REPLACE FUNCTION is_even"));
}
