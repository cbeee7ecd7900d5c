//! The schema model: column types and the ordered name -> type mapping that
//! every plan node carries.

use std::fmt;

/// The semantic type of a column, used for aggregate legality checks and
/// containment literal type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColType {
    Numeric,
    Text,
}

impl fmt::Display for ColType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColType::Numeric => write!(f, "NUMERIC"),
            ColType::Text => write!(f, "TEXT"),
        }
    }
}

/// The host-side type marker a caller uses when declaring an explicit
/// schema on `read_table`, analogous to passing Python's `int`/`str`/`float`
/// as the dict value in the original `grizzly.read_table(..., schema={...})`
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColSpec {
    Int,
    Float,
    Str,
    Bool,
}

impl From<ColSpec> for ColType {
    fn from(spec: ColSpec) -> Self {
        match spec {
            ColSpec::Int | ColSpec::Float => ColType::Numeric,
            // sqlite/postgres booleans behave like small integers in every
            // dialect this generator targets, but syntactically they read
            // closer to TEXT literals (`true`/`false` tokens) than to
            // arithmetic operands, so they're classified as TEXT here.
            ColSpec::Str | ColSpec::Bool => ColType::Text,
        }
    }
}

/// Ordered `name -> ColType` mapping. A [`Schema`] can be in the "unknown"
/// state: a table scanned with no explicit schema and no `inferSchema`
/// round-trip yet performed.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Option<Vec<(String, ColType)>>,
}

impl Schema {
    pub fn unknown() -> Self {
        Self { columns: None }
    }

    pub fn new(columns: Vec<(String, ColType)>) -> Self {
        Self {
            columns: Some(columns),
        }
    }

    pub fn from_specs(columns: Vec<(impl Into<String>, ColSpec)>) -> Self {
        Self::new(
            columns
                .into_iter()
                .map(|(name, spec)| (name.into(), ColType::from(spec)))
                .collect(),
        )
    }

    pub fn is_known(&self) -> bool {
        self.columns.is_some()
    }

    pub fn columns(&self) -> &[(String, ColType)] {
        self.columns.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.columns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns().iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns().iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<ColType> {
        self.columns()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns().iter().position(|(n, _)| n == name)
    }

    /// Numeric columns are the only ones SUM/MEAN may legally aggregate
    /// over, and the only ones `describe()` reports on.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns()
            .iter()
            .filter(|(_, t)| *t == ColType::Numeric)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn restrict(&self, names: &[String]) -> Schema {
        let columns = names
            .iter()
            .filter_map(|n| self.get(n).map(|t| (n.clone(), t)))
            .collect();
        Schema::new(columns)
    }

    pub fn push(&mut self, name: impl Into<String>, ty: ColType) {
        let name = name.into();
        let cols = self.columns.get_or_insert_with(Vec::new);
        if let Some(slot) = cols.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = ty;
        } else {
            cols.push((name, ty));
        }
    }

    pub fn concat(&self, other: &Schema) -> Schema {
        let mut columns = self.columns().to_vec();
        columns.extend(other.columns().iter().cloned());
        Schema::new(columns)
    }
}

/// Schema equality is an unordered-dict comparison: column order never
/// participates, only the name/type pairing.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        match (&self.columns, &other.columns) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, ty)| b.iter().any(|(n2, t2)| n2 == name && t2 == ty))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_equality() {
        let a = Schema::new(vec![
            ("x".into(), ColType::Numeric),
            ("y".into(), ColType::Text),
        ]);
        let b = Schema::new(vec![
            ("y".into(), ColType::Text),
            ("x".into(), ColType::Numeric),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_schema_has_zero_length() {
        let s = Schema::unknown();
        assert_eq!(s.len(), 0);
        assert!(!s.is_known());
    }

    #[test]
    fn from_specs_maps_host_types() {
        let s = Schema::from_specs(vec![
            ("globaleventid", ColSpec::Int),
            ("actor1name", ColSpec::Str),
            ("actiongeo_long", ColSpec::Float),
        ]);
        assert_eq!(s.get("globaleventid"), Some(ColType::Numeric));
        assert_eq!(s.get("actor1name"), Some(ColType::Text));
        assert_eq!(s.get("actiongeo_long"), Some(ColType::Numeric));
    }

    #[test]
    fn numeric_columns_filters_text() {
        let s = Schema::from_specs(vec![
            ("a", ColSpec::Int),
            ("b", ColSpec::Str),
            ("c", ColSpec::Float),
        ]);
        assert_eq!(s.numeric_columns(), vec!["a", "c"]);
    }
}
