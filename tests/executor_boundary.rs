//! Integration tests for the executor-boundary sinks in `collect.rs`,
//! exercised against the shared `MockExecutor` fixture rather than a live
//! database connection.

mod common;

use common::MockExecutor;
use grizzly::{close, use_executor, CountOutcome, Dialect, DataFrame, ColSpec, ColType, Literal, Schema, Value};

fn events() -> DataFrame {
    DataFrame::read_table_indexed(
        "events",
        Some(Schema::from_specs(vec![
            ("gid", ColSpec::Int),
            ("actor", ColSpec::Str),
        ])),
        "gid",
    )
}

#[test]
fn collect_materializes_rows_without_header() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("gid", ColType::Numeric), ("actor", ColType::Text)],
        vec![vec![Value::Int(1), Value::Str("a".into())]],
    ));
    let rows = events().collect(Dialect::Sqlite, false).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.rows[0][1], Value::Str("a".into()));
    close();
}

#[test]
fn len_counts_via_count_star() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(vec![("count", ColType::Numeric)], vec![vec![Value::Int(9)]]));
    assert_eq!(events().len(Dialect::Sqlite).unwrap(), 9);
    close();
}

#[test]
fn shape_pairs_width_with_len() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(vec![("count", ColType::Numeric)], vec![vec![Value::Int(3)]]));
    assert_eq!(events().shape(Dialect::Sqlite).unwrap(), (2, 3));
    close();
}

#[test]
fn count_with_column_returns_a_scalar() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(vec![("count", ColType::Numeric)], vec![vec![Value::Int(5)]]));
    let outcome = events().count(Dialect::Sqlite, Some("actor")).unwrap();
    match outcome {
        CountOutcome::Scalar(Value::Int(5)) => {}
        other => panic!("expected scalar count of 5, got {other:?}"),
    }
    close();
}

#[test]
fn count_without_column_fans_out_per_column() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("column", ColType::Text), ("value", ColType::Numeric)],
        vec![vec![Value::Str("gid".into()), Value::Int(5)], vec![Value::Str("actor".into()), Value::Int(5)]],
    ));
    let outcome = events().count(Dialect::Sqlite, None).unwrap();
    match outcome {
        CountOutcome::PerColumn(rows) => assert_eq!(rows.len(), 2),
        other => panic!("expected per-column counts, got {other:?}"),
    }
    close();
}

#[test]
fn contains_scalar_interprets_integer_boolean() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(vec![("exists", ColType::Numeric)], vec![vec![Value::Int(1)]]));
    let narrowed = events().select(&["actor"]).unwrap();
    assert!(narrowed.contains_scalar(Dialect::Sqlite, Literal::Str("a".into())).unwrap());
    close();
}

#[test]
fn at_reads_a_single_cell() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(vec![("actor", ColType::Text)], vec![vec![Value::Str("a".into())]]));
    let value = events().at(Dialect::Sqlite, Literal::Int(1), "actor").unwrap();
    assert_eq!(value, Value::Str("a".into()));
    close();
}

#[test]
fn loc_with_a_list_returns_every_matching_row() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("gid", ColType::Numeric), ("actor", ColType::Text)],
        vec![
            vec![Value::Int(1), Value::Str("a".into())],
            vec![Value::Int(2), Value::Str("b".into())],
        ],
    ));
    let rows = events().loc(Dialect::Sqlite, vec![Literal::Int(1), Literal::Int(2)]).unwrap();
    assert_eq!(rows.len(), 2);
    close();
}

#[test]
fn loc_without_index_column_is_rejected() {
    let df = DataFrame::read_table("events", Some(Schema::from_specs(vec![("gid", ColSpec::Int)])));
    let err = df.loc(Dialect::Sqlite, vec![Literal::Int(1)]).unwrap_err();
    assert!(matches!(err, grizzly::GrizzlyError::Value(_)));
}

#[test]
fn tail_reverses_the_limited_rows_back_to_original_order() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("gid", ColType::Numeric), ("actor", ColType::Text)],
        vec![
            vec![Value::Int(3), Value::Str("c".into())],
            vec![Value::Int(2), Value::Str("b".into())],
        ],
    ));
    let rows = events().tail(Dialect::Sqlite, 2).unwrap();
    assert_eq!(rows.rows[0][0], Value::Int(2));
    assert_eq!(rows.rows[1][0], Value::Int(3));
    close();
}

#[test]
fn iterrows_pairs_each_row_with_its_ordinal() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("gid", ColType::Numeric), ("actor", ColType::Text)],
        vec![vec![Value::Int(1), Value::Str("a".into())]],
    ));
    let rows = events().iterrows(Dialect::Sqlite).unwrap();
    assert_eq!(rows[0].0, 0);
    close();
}

#[test]
fn show_renders_a_pretty_table_with_a_header_separator() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("gid", ColType::Numeric), ("actor", ColType::Text)],
        vec![vec![Value::Int(1), Value::Str("a".into())]],
    ));
    let rendered = events().show(Dialect::Sqlite, None, true, None).unwrap();
    let lines: Vec<&str> = rendered.lines().collect();
    assert!(lines[1].chars().all(|c| c == '-' || c == '+'));
    close();
}

#[test]
fn show_truncates_wide_cells_when_a_max_width_is_given() {
    let _guard = common::lock_executor();
    use_executor(MockExecutor::new(
        vec![("actor", ColType::Text)],
        vec![vec![Value::Str("a-very-long-actor-name".into())]],
    ));
    let df = DataFrame::read_table("events", Some(Schema::from_specs(vec![("actor", ColSpec::Str)])));
    let rendered = df.show(Dialect::Sqlite, None, false, Some(5)).unwrap();
    assert!(rendered.contains("…"));
    close();
}
