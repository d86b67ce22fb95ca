//! Operators and indexing on runtime values.
//!
//! Integer arithmetic is checked. Mixing an integer with a float promotes to
//! float. `+` concatenates when either side is a string and appends to lists.

use std::sync::Arc;

use strand_runtime::errors::{
    division_by_zero, index_out_of_bounds, integer_overflow, invalid_binary_op, type_mismatch,
};
use strand_runtime::{int_to_float, EvalError, EvalResult, Value};

use crate::ast::{BinaryOp, UnaryOp};

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> EvalResult {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("negation")),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(type_mismatch("number", other.type_name())),
    }
}

/// Evaluate a binary operator whose operands are both already evaluated.
/// `&&` and `||` short-circuit in the interpreter and only land here for
/// completeness.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = left
                .compare(right)
                .ok_or_else(|| mismatch(op, left, right))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, left, right)
        }
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    invalid_binary_op(op.as_symbol(), left.type_name(), right.type_name())
}

fn add(left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::from(format!("{left}{right}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = Vec::with_capacity(a.len() + b.len());
            items.extend(a.iter().cloned());
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        }
        (Value::List(a), item) => {
            let mut items = Vec::with_capacity(a.len() + 1);
            items.extend(a.iter().cloned());
            items.push(item.clone());
            Ok(Value::list(items))
        }
        _ => arithmetic(BinaryOp::Add, left, right),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        (Value::Int(a), Value::Float(b)) => Ok(float_arithmetic(op, int_to_float(*a), *b)),
        (Value::Float(a), Value::Int(b)) => Ok(float_arithmetic(op, *a, int_to_float(*b))),
        (Value::Float(a), Value::Float(b)) => Ok(float_arithmetic(op, *a, *b)),
        (Value::Str(s), Value::Int(n)) if op == BinaryOp::Mul => {
            let count = usize::try_from(*n).map_err(|_| mismatch(op, left, right))?;
            Ok(Value::from(s.repeat(count)))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> EvalResult {
    let (result, operation) = match op {
        BinaryOp::Add => (a.checked_add(b), "addition"),
        BinaryOp::Sub => (a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => (a.checked_mul(b), "multiplication"),
        BinaryOp::Div => {
            if b == 0 {
                return Err(division_by_zero());
            }
            (a.checked_div(b), "division")
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(division_by_zero());
            }
            (a.checked_rem(b), "remainder")
        }
        _ => return Err(invalid_binary_op(op.as_symbol(), "int", "int")),
    };
    result
        .map(Value::Int)
        .ok_or_else(|| integer_overflow(operation))
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Value {
    Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    })
}

/// Keys of map literals and map indexing are strings.
pub(crate) fn map_key(key: &Value) -> String {
    match key {
        Value::Str(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Position of `index` in a sequence of `len`, counting negatives from the end.
fn position(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    usize::try_from(resolved).ok()
}

/// `receiver[index]`
pub(crate) fn index(receiver: &Value, index: &Value) -> EvalResult {
    match (receiver, index) {
        (Value::List(items), Value::Int(i)) => position(*i, items.len())
            .and_then(|at| items.get(at))
            .cloned()
            .ok_or_else(|| index_out_of_bounds(*i)),
        (Value::Str(s), Value::Int(i)) => {
            let count = s.chars().count();
            position(*i, count)
                .and_then(|at| s.chars().nth(at))
                .map(|c| Value::from(c.to_string()))
                .ok_or_else(|| index_out_of_bounds(*i))
        }
        (Value::Map(entries), key) => Ok(entries.get(&map_key(key)).cloned().unwrap_or(Value::Null)),
        (Value::Null, _) => Err(EvalError::new("cannot index null")),
        (Value::List(_) | Value::Str(_), other) => Err(type_mismatch("int", other.type_name())),
        (other, _) => Err(type_mismatch("list, map or string", other.type_name())),
    }
}

/// `receiver[index] = value`, returning the updated collection. Writing past
/// the end of a list pads it with nulls.
pub(crate) fn set_index(receiver: Value, index: &Value, value: Value) -> EvalResult {
    match (receiver, index) {
        (Value::List(mut items), Value::Int(i)) => {
            let at = position(*i, items.len()).ok_or_else(|| index_out_of_bounds(*i))?;
            let items_mut = Arc::make_mut(&mut items);
            if at >= items_mut.len() {
                items_mut.resize(at + 1, Value::Null);
            }
            items_mut[at] = value;
            Ok(Value::List(items))
        }
        (Value::Map(mut entries), key) => {
            Arc::make_mut(&mut entries).insert(map_key(key), value);
            Ok(Value::Map(entries))
        }
        (Value::Null, _) => Err(EvalError::new("cannot index null")),
        (Value::List(_), other) => Err(type_mismatch("int", other.type_name())),
        (other, _) => Err(type_mismatch("list or map", other.type_name())),
    }
}
