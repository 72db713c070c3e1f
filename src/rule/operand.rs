use super::ValueType;
use serde_json::Value as Json;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// The right-hand side of a single-operand rule, coerced from its literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Str(String),
    /// `NaN` when the literal does not parse.
    Num(f64),
    Bool(bool),
    /// The payload currently in the rule's scope, compared against the previous one.
    CurrentPayload,
}

impl Operand {
    pub(crate) fn from_literal(literal: &str, value_type: ValueType) -> Self {
        match value_type {
            ValueType::Num => Operand::Num(parse_number(literal)),
            ValueType::Bool => Operand::Bool(literal.trim().eq_ignore_ascii_case("true")),
            ValueType::Prev => Operand::CurrentPayload,
            ValueType::Str | ValueType::Jsonata => Operand::Str(literal.to_string()),
        }
    }

    /// Value equality between the resolved left side and this operand.
    pub(crate) fn equals(&self, left: Option<&Json>, current: Option<&Json>) -> bool {
        match self {
            Operand::Str(expected) => text_of(left).is_some_and(|l| l == expected.as_str()),
            Operand::Num(expected) => number_of(left) == *expected,
            Operand::Bool(expected) => bool_of(left) == Some(*expected),
            Operand::CurrentPayload => match (left, current) {
                (Some(l), Some(c)) => json_equals(l, c),
                _ => false,
            },
        }
    }

    /// Ordering of the resolved left side relative to this operand, `None` when
    /// the two cannot be ordered.
    pub(crate) fn order(&self, left: Option<&Json>, current: Option<&Json>) -> Option<Ordering> {
        match self {
            Operand::Str(expected) => text_of(left).map(|l| str::cmp(&l, expected)),
            Operand::Num(expected) => number_of(left).partial_cmp(expected),
            Operand::Bool(expected) => bool_of(left).map(|l| l.cmp(expected)),
            Operand::CurrentPayload => natural_order(left?, current?),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Str(s) => write!(f, "{:?}", s),
            Operand::Num(n) => write!(f, "{}", n),
            Operand::Bool(b) => write!(f, "{}", b),
            Operand::CurrentPayload => write!(f, "current payload"),
        }
    }
}

/// The inclusive bounds of a `btwn` rule.
///
/// Bounds are kept in the order given; a range whose low bound exceeds its
/// high bound contains nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Range {
    /// Used when either bound is numeric. Unparsable bounds are `NaN`.
    Numeric { low: f64, high: f64 },
    Lexical { low: String, high: String },
}

impl Range {
    pub(crate) fn new(low: &str, low_is_numeric: bool, high: &str, high_is_numeric: bool) -> Self {
        if low_is_numeric || high_is_numeric {
            Range::Numeric {
                low: parse_number(low),
                high: parse_number(high),
            }
        } else {
            Range::Lexical {
                low: low.to_string(),
                high: high.to_string(),
            }
        }
    }

    pub(crate) fn contains(&self, left: Option<&Json>) -> bool {
        match self {
            Range::Numeric { low, high } => {
                let value = number_of(left);
                *low <= value && value <= *high
            }
            Range::Lexical { low, high } => text_of(left)
                .is_some_and(|value| low.as_str() <= &*value && &*value <= high.as_str()),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::Numeric { low, high } => write!(f, "{} and {}", low, high),
            Range::Lexical { low, high } => write!(f, "{:?} and {:?}", low, high),
        }
    }
}

fn parse_number(literal: &str) -> f64 {
    literal.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Text form of a resolved value. Absent and `null` have none.
pub(crate) fn text_of(value: Option<&Json>) -> Option<Cow<'_, str>> {
    match value? {
        Json::Null => None,
        Json::String(s) => Some(Cow::Borrowed(s.as_str())),
        Json::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// Numeric form of a resolved value; anything that is neither a number nor a
/// numeric string is `NaN`.
pub(crate) fn number_of(value: Option<&Json>) -> f64 {
    match value {
        Some(Json::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Json::String(s)) => parse_number(s),
        _ => f64::NAN,
    }
}

fn bool_of(value: Option<&Json>) -> Option<bool> {
    match value? {
        Json::Bool(b) => Some(*b),
        Json::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Json::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn json_equals(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Numbers order numerically; any other pair orders by text form.
fn natural_order(a: &Json, b: &Json) -> Option<Ordering> {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        _ => Some(text_of(Some(a))?.cmp(&text_of(Some(b))?)),
    }
}
