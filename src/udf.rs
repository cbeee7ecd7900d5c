//! User-defined scalar functions, lowered to `CREATE OR REPLACE FUNCTION`
//! statements by the generator.
//!
//! Introspecting a Rust function's body at runtime has no stable equivalent
//! of reflecting a scripting language's source text, so there is no
//! host-side function-source extractor here: callers construct a
//! [`UdfDef`] directly with the body text they want inlined.

use std::fmt;

/// Host-language type tag for a UDF parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    Float,
    Str,
    Bool,
    Any,
}

impl TypeTag {
    /// Maps a host type tag to its `CREATE FUNCTION` parameter/return
    /// spelling. The `Any` tag has no sensible default and is rejected by
    /// the generator.
    pub fn sql_name(self) -> Option<&'static str> {
        match self {
            TypeTag::Int => Some("integer"),
            TypeTag::Float => Some("float"),
            TypeTag::Str => Some("text"),
            TypeTag::Bool => Some("boolean"),
            TypeTag::Any => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Str => write!(f, "str"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Any => write!(f, "any"),
        }
    }
}

/// Everything the generator needs to emit one `CREATE OR REPLACE FUNCTION`
/// prologue for a user-defined scalar function.
#[derive(Debug, Clone, PartialEq)]
pub struct UdfDef {
    pub name: String,
    pub params: Vec<(String, TypeTag)>,
    pub return_type: TypeTag,
    pub body: String,
}

impl UdfDef {
    pub fn new(
        name: impl Into<String>,
        params: Vec<(impl Into<String>, TypeTag)>,
        return_type: TypeTag,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            return_type,
            body: body.into(),
        }
    }
}
