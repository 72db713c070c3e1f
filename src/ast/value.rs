use itertools::Itertools;
use serde_json::Value as Json;
use std::fmt;

/// Runtime value types used during expression evaluation.
///
/// `Undefined` is distinct from `Null`: it is what a path yields when the
/// message has nothing at that location.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(serde_json::Map<String, Json>),
}

impl Value {
    pub fn from_json(json: Option<&Json>) -> Self {
        match json {
            None => Value::Undefined,
            Some(Json::Null) => Value::Null,
            Some(Json::Bool(b)) => Value::Bool(*b),
            Some(Json::Number(n)) => n.as_f64().map_or(Value::Null, Value::Number),
            Some(Json::String(s)) => Value::String(s.clone()),
            Some(Json::Array(items)) => {
                Value::Array(items.iter().map(|i| Value::from_json(Some(i))).collect())
            }
            Some(Json::Object(map)) => Value::Object(map.clone()),
        }
    }

    /// Truthiness as defined by JSONata's `$boolean`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => items.iter().any(Value::is_truthy),
            Value::Object(map) => !map.is_empty(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns the name used for this variant in type mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    /// Renders the value the way `$string` and `&` see it: strings stay bare,
    /// everything else becomes compact JSON.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Undefined => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => write!(f, "[{}]", items.iter().join(", ")),
            Value::Object(map) => write!(f, "{}", Json::Object(map.clone())),
        }
    }
}
