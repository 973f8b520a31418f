//! Attribute values and weak-typed coercion
//!
//! Configuration attributes are dynamically typed at the syntax level. The
//! [`Value`] sum is closed on purpose: connector factories downstream can
//! pattern-match it safely instead of reflecting over an any-type.
//!
//! Coercion is deliberately weak, inherited from the original format: a
//! boolean-looking string decodes as a boolean, and a float with a zero
//! fractional part decodes as an integer. The rules are reproduced as-is
//! rather than tightened.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque mapping of attribute names to values, forwarded verbatim to
/// connector factories
pub type ValueMap = BTreeMap<String, Value>;

/// A dynamically typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Literal string
    String(String),

    /// Literal boolean
    Bool(bool),

    /// Integer number
    Int(i64),

    /// Floating-point number
    Float(f64),

    /// Ordered list of values
    List(Vec<Value>),

    /// Nested key/value object
    Object(ValueMap),
}

impl Value {
    /// Short name of the value's shape, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Weak-decode into a string
    ///
    /// Only a literal string is accepted; anything else is a type error.
    pub fn weak_string(&self) -> std::result::Result<String, CoerceError> {
        match self {
            Value::String(s) => Ok(s.clone()),
            other => Err(CoerceError::new("string", other)),
        }
    }

    /// Weak-decode into a boolean
    ///
    /// Accepts a literal boolean or one of the recognized boolean strings
    /// (`1`/`t`/`T`/`TRUE`/`true`/`True` and the false equivalents).
    pub fn weak_bool(&self) -> std::result::Result<bool, CoerceError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.as_str() {
                "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
                "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
                _ => Err(CoerceError::new("bool", self)),
            },
            other => Err(CoerceError::new("bool", other)),
        }
    }

    /// Weak-decode into an integer
    ///
    /// Accepts a literal integer, or a float whose fractional part is zero.
    pub fn weak_int(&self) -> std::result::Result<i64, CoerceError> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            other => Err(CoerceError::new("int", other)),
        }
    }

    /// Weak-decode into a list of strings
    ///
    /// Every element must itself decode as a string; the first element that
    /// fails invalidates the whole attribute.
    pub fn weak_string_list(&self) -> std::result::Result<Vec<String>, CoerceError> {
        match self {
            Value::List(items) => items.iter().map(|item| item.weak_string()).collect(),
            other => Err(CoerceError::new("list of string", other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::List(_) => write!(f, "list"),
            Value::Object(_) => write!(f, "object"),
        }
    }
}

/// A weak-decode failure: the value's shape did not fit the target type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError {
    expected: &'static str,
    found: String,
}

impl CoerceError {
    fn new(expected: &'static str, found: &Value) -> Self {
        let found = match found {
            Value::List(_) | Value::Object(_) => found.kind().to_string(),
            scalar => format!("{} {}", scalar.kind(), scalar),
        };
        Self { expected, found }
    }
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for CoerceError {}
