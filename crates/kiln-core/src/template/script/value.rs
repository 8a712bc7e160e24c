//! Conversions and operators over `serde_json::Value`

use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Stringify a value for template output
///
/// Strings print verbatim, integral floats drop their fraction, arrays join their
/// elements with `,`, objects print as JSON.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => stringify_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn stringify_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Name of a value's type for error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Numeric operand, kept integral while both sides are
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn of(value: &Value) -> Option<Num> {
        let Value::Number(n) = value else {
            return None;
        };
        match n.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => n.as_f64().map(Num::Float),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

/// Apply an arithmetic operator
///
/// Integer overflow falls back to floating point. Returns `None` on division by zero.
pub(crate) fn arithmetic(
    lhs: Num,
    rhs: Num,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Option<Value> {
    if let (Num::Int(a), Num::Int(b)) = (lhs, rhs) {
        if let Some(result) = int_op(a, b) {
            return Some(Value::from(result));
        }
        if b == 0 {
            return None;
        }
    }
    let (a, b) = (lhs.as_f64(), rhs.as_f64());
    let result = float_op(a, b);
    if result.is_nan() || result.is_infinite() {
        return None;
    }
    Some(float(result))
}

/// Equality with numbers compared by value (`1 == 1.0`)
pub(crate) fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (Num::of(lhs), Num::of(rhs)) {
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

/// Ordering for numbers and strings; `None` for anything else
pub(crate) fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (Num::of(lhs)?, Num::of(rhs)?) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        },
    }
}
