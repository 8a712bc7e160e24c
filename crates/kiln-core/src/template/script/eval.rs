//! Expression evaluation

use super::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::value::{Num, arithmetic, compare, float, is_truthy, loose_eq, stringify, type_name};
use crate::error::TemplateError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Renders partials on behalf of `render(...)` calls
pub(crate) trait PartialHost {
    fn render_partial(&mut self, reference: &str, locals: &Value) -> Result<String, EvalError>;
}

#[derive(Debug)]
pub(crate) enum EvalError {
    /// Failure of the expression itself; the caller attaches path and line
    Message(String),
    /// Failure inside a partial, already carrying its own location
    Template(Box<TemplateError>),
}

impl From<TemplateError> for EvalError {
    fn from(err: TemplateError) -> Self {
        EvalError::Template(Box::new(err))
    }
}

fn fail<T>(message: impl Into<String>) -> Result<T, EvalError> {
    Err(EvalError::Message(message.into()))
}

/// Variable bindings for one renderer execution
///
/// Names resolve against `let`/loop bindings first (innermost wins), then the keys
/// of the locals mapping. `locals` names the mapping itself.
pub(crate) struct Scope<'a> {
    locals: &'a Value,
    bindings: Vec<(String, Value)>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(locals: &'a Value) -> Self {
        Self {
            locals,
            bindings: Vec::new(),
        }
    }

    pub(crate) fn locals(&self) -> &'a Value {
        self.locals
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        if let Some((_, value)) = self.bindings.iter().rev().find(|(n, _)| n == name) {
            return Some(value.clone());
        }
        if name == "locals" {
            return Some(self.locals.clone());
        }
        self.locals.get(name).cloned()
    }

    pub(crate) fn bind(&mut self, name: &str, value: Value) {
        self.bindings.push((name.to_string(), value));
    }

    /// Current binding depth, to restore with [`Scope::reset`]
    pub(crate) fn mark(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }
}

pub(crate) fn eval(
    expr: &Expr,
    scope: &Scope<'_>,
    host: &mut dyn PartialHost,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => match scope.lookup(name) {
            Some(value) => Ok(value),
            None => fail(format!("'{}' is not defined", name)),
        },
        Expr::Member(target, name) => {
            let target = eval(target, scope, host)?;
            member(&target, name)
        }
        Expr::Index(target, index) => {
            let target = eval(target, scope, host)?;
            let index = eval(index, scope, host)?;
            lookup_index(&target, &index)
        }
        Expr::Call(name, args) => call(name, args, scope, host),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, scope, host))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(fields) => {
            let mut map = Map::new();
            for (key, value) in fields {
                map.insert(key.clone(), eval(value, scope, host)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Unary(op, operand) => {
            let operand = eval(operand, scope, host)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!is_truthy(&operand))),
                UnaryOp::Neg => match Num::of(&operand) {
                    Some(Num::Int(i)) => Ok(i
                        .checked_neg()
                        .map(Value::from)
                        .unwrap_or_else(|| float(-(i as f64)))),
                    Some(Num::Float(f)) => Ok(float(-f)),
                    None => fail(format!("Cannot negate a {}", type_name(&operand))),
                },
            }
        }
        Expr::Logical(op, lhs, rhs) => {
            let lhs = eval(lhs, scope, host)?;
            let take_rhs = match op {
                LogicalOp::And => is_truthy(&lhs),
                LogicalOp::Or => !is_truthy(&lhs),
            };
            if take_rhs { eval(rhs, scope, host) } else { Ok(lhs) }
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, scope, host)?;
            let rhs = eval(rhs, scope, host)?;
            binary(*op, &lhs, &rhs)
        }
    }
}

fn member(target: &Value, name: &str) -> Result<Value, EvalError> {
    match target {
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
        Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
        Value::Array(_) | Value::String(_) => Ok(Value::Null),
        other => fail(format!(
            "Cannot read property '{}' of {}",
            name,
            type_name(other)
        )),
    }
}

fn lookup_index(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match (target, index) {
        (Value::Object(_), Value::String(key)) => member(target, key),
        (Value::Array(items), Value::Number(n)) => Ok(n
            .as_u64()
            .and_then(|i| items.get(i as usize))
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::Array(_), Value::String(key)) => member(target, key),
        _ => fail(format!(
            "Cannot index a {} with a {}",
            type_name(target),
            type_name(index)
        )),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(lhs, rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_eq(lhs, rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let Some(ordering) = compare(lhs, rhs) else {
                return fail(format!(
                    "Cannot compare a {} with a {}",
                    type_name(lhs),
                    type_name(rhs)
                ));
            };
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => match (Num::of(lhs), Num::of(rhs)) {
            (Some(a), Some(b)) => numeric(op, a, b),
            _ => Ok(Value::String(stringify(lhs) + &stringify(rhs))),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            match (Num::of(lhs), Num::of(rhs)) {
                (Some(a), Some(b)) => numeric(op, a, b),
                _ => fail(format!(
                    "Arithmetic on a {} and a {}",
                    type_name(lhs),
                    type_name(rhs)
                )),
            }
        }
    }
}

fn numeric(op: BinaryOp, a: Num, b: Num) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => arithmetic(a, b, i64::checked_add, |x, y| x + y),
        BinaryOp::Sub => arithmetic(a, b, i64::checked_sub, |x, y| x - y),
        BinaryOp::Mul => arithmetic(a, b, i64::checked_mul, |x, y| x * y),
        BinaryOp::Div => arithmetic(a, b, exact_div, |x, y| x / y),
        _ => arithmetic(a, b, i64::checked_rem, |x, y| x % y),
    };
    match result {
        Some(value) => Ok(value),
        None => fail("Division by zero"),
    }
}

/// Integer division only when it is exact; otherwise the float path runs
fn exact_div(a: i64, b: i64) -> Option<i64> {
    a.checked_rem(b)
        .filter(|&r| r == 0)
        .and_then(|_| a.checked_div(b))
}

fn call(
    name: &str,
    args: &[Expr],
    scope: &Scope<'_>,
    host: &mut dyn PartialHost,
) -> Result<Value, EvalError> {
    let values = args
        .iter()
        .map(|arg| eval(arg, scope, host))
        .collect::<Result<Vec<_>, _>>()?;

    match (name, values.as_slice()) {
        ("render", [Value::String(reference)]) => {
            Ok(Value::String(host.render_partial(reference, scope.locals())?))
        }
        ("render", [Value::String(reference), locals]) => {
            Ok(Value::String(host.render_partial(reference, locals)?))
        }
        ("render", [other, ..]) if !other.is_string() => fail(format!(
            "render() expects a template path, got a {}",
            type_name(other)
        )),
        ("len", [value]) => match value {
            Value::String(s) => Ok(Value::from(s.chars().count())),
            Value::Array(items) => Ok(Value::from(items.len())),
            Value::Object(map) => Ok(Value::from(map.len())),
            other => fail(format!("len() of a {}", type_name(other))),
        },
        ("json", [value]) => Ok(Value::String(value.to_string())),
        ("upper", [value]) => Ok(Value::String(stringify(value).to_uppercase())),
        ("lower", [value]) => Ok(Value::String(stringify(value).to_lowercase())),
        ("render" | "len" | "json" | "upper" | "lower", _) => fail(format!(
            "Wrong number of arguments to {}(): {}",
            name,
            values.len()
        )),
        _ => fail(format!("Unknown function '{}'", name)),
    }
}
