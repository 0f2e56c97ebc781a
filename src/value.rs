//! Cell values and tuples.
//!
//! Relations arriving through [`crate::tuple_store::TupleStore::load`] carry
//! untyped textual cells, one per column; values are inferred from their
//! textual form, then the engines dense-re-encode each column into
//! `1..=distinct` keys during level-1 initialization.

use std::sync::Arc;

/// A single cell value, inferred from its textual representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(Arc<str>),
    Null,
}

impl Value {
    /// Infer a value from a raw CSV field: null, bool, int, float, then
    /// string, in that precedence order.
    pub fn parse(raw: &str) -> Value {
        let s = raw.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("null") || s == "\\N" {
            return Value::Null;
        }
        if s.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int64(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float64(f);
        }
        Value::String(Arc::from(s))
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Int64(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Value::Float64(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
            Value::Bool(b) => {
                2u8.hash(state);
                b.hash(state);
            }
            Value::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Value::Null => 4u8.hash(state),
        }
    }
}

/// A fixed-arity row of values, in original column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple(pub Vec<Value>);

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Tuple(values)
    }

    pub fn get(&self, col: usize) -> &Value {
        &self.0[col]
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}
