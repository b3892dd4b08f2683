use std::cmp::Ordering;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::error::EvalError;
use crate::{Facts, Value};

/// Evaluate a parsed expression against the facts.
pub(crate) fn eval(expr: &Expr, facts: &Facts) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => {
            facts
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownVariable { name: name.clone() })
        }
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, facts))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Field { target, name } => field(eval(target, facts)?, name),
        Expr::Index { target, index } => {
            let target = eval(target, facts)?;
            let index = eval(index, facts)?;
            index_into(target, &index)
        }
        Expr::Method { target, name, args } => {
            let target = eval(target, facts)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, facts))
                .collect::<Result<Vec<_>, _>>()?;
            call_method(&target, name, &args)
        }
        Expr::Unary { op, operand } => unary(*op, eval(operand, facts)?),
        Expr::Binary { op, left, right } => {
            let left = eval(left, facts)?;
            let right = eval(right, facts)?;
            binary(*op, left, right)
        }
        Expr::And(left, right) => {
            if !boolean(eval(left, facts)?, "and")? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(boolean(eval(right, facts)?, "and")?))
        }
        Expr::Or(left, right) => {
            if boolean(eval(left, facts)?, "or")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(boolean(eval(right, facts)?, "or")?))
        }
        Expr::Ternary {
            condition,
            then,
            otherwise,
        } => {
            if boolean(eval(condition, facts)?, "?:")? {
                eval(then, facts)
            } else {
                eval(otherwise, facts)
            }
        }
    }
}

fn boolean(value: Value, context: &'static str) -> Result<bool, EvalError> {
    value.as_bool().ok_or(EvalError::NotBoolean {
        context,
        found: value.type_name(),
    })
}

fn field(target: Value, name: &str) -> Result<Value, EvalError> {
    match target {
        Value::Map(mut entries) => entries
            .remove(name)
            .ok_or_else(|| EvalError::UnknownProperty {
                property: name.to_owned(),
                type_name: "map",
            }),
        Value::Null => Err(EvalError::NullReference {
            member: name.to_owned(),
        }),
        other => Err(EvalError::UnknownProperty {
            property: name.to_owned(),
            type_name: other.type_name(),
        }),
    }
}

/// Lists index by position; maps index by key and yield `null` for a
/// missing key.
fn index_into(target: Value, index: &Value) -> Result<Value, EvalError> {
    match (target, index) {
        (Value::List(mut items), Value::Int(i)) => {
            let len = items.len();
            let position = usize::try_from(*i)
                .ok()
                .filter(|p| *p < len)
                .ok_or(EvalError::IndexOutOfBounds { index: *i, len })?;
            Ok(items.swap_remove(position))
        }
        (Value::Map(mut entries), Value::String(key)) => {
            Ok(entries.remove(key.as_str()).unwrap_or(Value::Null))
        }
        (Value::Null, _) => Err(EvalError::NullReference {
            member: index.to_string(),
        }),
        (target, index) => Err(EvalError::TypeMismatch {
            op: "[]",
            left: target.type_name(),
            right: index.type_name(),
        }),
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arity {
            method: method.to_owned(),
            expected,
            found: args.len(),
        })
    }
}

fn string_arg<'a>(op: &'static str, target: &Value, arg: &'a Value) -> Result<&'a str, EvalError> {
    arg.as_str().ok_or(EvalError::TypeMismatch {
        op,
        left: target.type_name(),
        right: arg.type_name(),
    })
}

#[allow(clippy::cast_possible_wrap)]
fn length(len: usize) -> Value {
    Value::Int(len as i64)
}

fn call_method(target: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    if target.is_null() {
        return Err(EvalError::NullReference {
            member: method.to_owned(),
        });
    }
    match (method, target) {
        ("contains", Value::String(s)) => {
            expect_args(method, args, 1)?;
            let needle = string_arg("contains", target, &args[0])?;
            Ok(Value::Bool(s.contains(needle)))
        }
        ("contains", Value::List(items)) => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(items.iter().any(|item| item.loose_eq(&args[0]))))
        }
        ("contains", Value::Map(entries)) => {
            expect_args(method, args, 1)?;
            let key = string_arg("contains", target, &args[0])?;
            Ok(Value::Bool(entries.contains_key(key)))
        }
        ("startsWith", Value::String(s)) => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(s.starts_with(string_arg("startsWith", target, &args[0])?)))
        }
        ("endsWith", Value::String(s)) => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(s.ends_with(string_arg("endsWith", target, &args[0])?)))
        }
        ("size" | "length", Value::String(s)) => {
            expect_args(method, args, 0)?;
            Ok(length(s.chars().count()))
        }
        ("size" | "length", Value::List(items)) => {
            expect_args(method, args, 0)?;
            Ok(length(items.len()))
        }
        ("size" | "length", Value::Map(entries)) => {
            expect_args(method, args, 0)?;
            Ok(length(entries.len()))
        }
        ("isEmpty", Value::String(s)) => {
            expect_args(method, args, 0)?;
            Ok(Value::Bool(s.is_empty()))
        }
        ("isEmpty", Value::List(items)) => {
            expect_args(method, args, 0)?;
            Ok(Value::Bool(items.is_empty()))
        }
        ("isEmpty", Value::Map(entries)) => {
            expect_args(method, args, 0)?;
            Ok(Value::Bool(entries.is_empty()))
        }
        ("toUpperCase", Value::String(s)) => {
            expect_args(method, args, 0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        ("toLowerCase", Value::String(s)) => {
            expect_args(method, args, 0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        _ => Err(EvalError::UnknownMethod {
            method: method.to_owned(),
            type_name: target.type_name(),
        }),
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "-" }),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (op, operand) => Err(EvalError::InvalidOperand {
            op: op.symbol(),
            operand: operand.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(&right))),
        BinaryOp::Neq => Ok(Value::Bool(!left.loose_eq(&right))),
        BinaryOp::Gt | BinaryOp::Gte | BinaryOp::Lt | BinaryOp::Lte => {
            let ordering = left
                .partial_cmp_value(&right)
                .ok_or(EvalError::TypeMismatch {
                    op: op.symbol(),
                    left: left.type_name(),
                    right: right.type_name(),
                })?;
            Ok(Value::Bool(match op {
                BinaryOp::Gt => ordering == Ordering::Greater,
                BinaryOp::Gte => ordering != Ordering::Less,
                BinaryOp::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            }))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }
    }
}

/// Text used when a value is concatenated onto a string.
fn concat_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        (Value::String(_), _) | (_, Value::String(_)) if op == BinaryOp::Add => Ok(
            Value::String(format!("{}{}", concat_text(&left), concat_text(&right))),
        ),
        _ => match (as_float(&left), as_float(&right)) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b),
            _ => Err(EvalError::TypeMismatch {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            }),
        },
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        _ => a.checked_rem(b),
    };
    result
        .map(Value::Int)
        .ok_or(EvalError::Overflow { op: op.symbol() })
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}
