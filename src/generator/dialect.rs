//! The dialect parameter table: per-backend type spellings, UDF language
//! tag, external-table DDL support, and boolean rendering.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::schema::ColSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgresql,
    Vector,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgresql => "postgresql",
            Dialect::Vector => "vector",
        }
    }

    pub fn parse(name: &str) -> Option<Dialect> {
        match name {
            "sqlite" => Some(Dialect::Sqlite),
            "postgresql" => Some(Dialect::Postgresql),
            "vector" => Some(Dialect::Vector),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DialectParams {
    pub string_type: &'static str,
    /// `None` means the dialect has no UDF language tag (sqlite has no
    /// in-process scalar function language this generator can target).
    pub udf_language: Option<&'static str>,
    pub supports_external_table: bool,
    pub bool_true: &'static str,
    pub bool_false: &'static str,
}

lazy_static! {
    static ref DIALECT_TABLE: HashMap<Dialect, DialectParams> = {
        let mut m = HashMap::new();
        m.insert(
            Dialect::Sqlite,
            DialectParams {
                string_type: "TEXT",
                udf_language: None,
                supports_external_table: false,
                bool_true: "1",
                bool_false: "0",
            },
        );
        m.insert(
            Dialect::Postgresql,
            DialectParams {
                string_type: "text",
                udf_language: Some("plpython3u"),
                supports_external_table: false,
                bool_true: "true",
                bool_false: "false",
            },
        );
        m.insert(
            Dialect::Vector,
            DialectParams {
                string_type: "VARCHAR(1024)",
                udf_language: None,
                supports_external_table: true,
                bool_true: "true",
                bool_false: "false",
            },
        );
        m
    };
}

pub fn params(dialect: Dialect) -> &'static DialectParams {
    DIALECT_TABLE
        .get(&dialect)
        .expect("every Dialect variant has a table entry")
}

/// The column-declaration spelling used in external-table DDL. Distinct
/// from [`crate::udf::TypeTag::sql_name`]'s `CREATE FUNCTION` spellings —
/// `int`/`float` here, `integer`/`float` there.
pub fn ddl_type_name(spec: ColSpec, dialect_params: &DialectParams) -> &'static str {
    match spec {
        ColSpec::Int => "int",
        ColSpec::Float => "float",
        ColSpec::Str => dialect_params.string_type,
        ColSpec::Bool => "boolean",
    }
}
