//! Integer and float methods.

use super::{arity, callable_arg, int_arg};
use crate::errors::{integer_overflow, EvalResult};
use crate::session::Invocation;
use crate::value::{int_to_float, Value};

pub(super) fn int_call(
    n: i64,
    method: &str,
    args: &[Value],
    inv: &Invocation,
) -> Option<EvalResult> {
    let result = match method {
        "abs" => arity(method, args, 0).and_then(|()| {
            n.checked_abs()
                .map(Value::Int)
                .ok_or_else(|| integer_overflow("abs"))
        }),
        "toInteger" | "intValue" => arity(method, args, 0).map(|()| Value::Int(n)),
        "toDouble" | "toFloat" => arity(method, args, 0).map(|()| Value::Float(int_to_float(n))),
        "times" => callable_arg(method, args, 0).and_then(|f| {
            for i in 0..n {
                inv.check_interrupt()?;
                inv.call(f, &[Value::Int(i)])?;
            }
            Ok(Value::Null)
        }),
        "upto" => arity(method, args, 2).and_then(|()| {
            let end = int_arg(method, args, 0)?;
            let f = callable_arg(method, args, 1)?;
            for i in n..=end {
                inv.check_interrupt()?;
                inv.call(f, &[Value::Int(i)])?;
            }
            Ok(Value::Null)
        }),
        _ => return None,
    };
    Some(result)
}

pub(super) fn float_call(x: f64, method: &str, args: &[Value]) -> Option<EvalResult> {
    let result = match method {
        "abs" => arity(method, args, 0).map(|()| Value::Float(x.abs())),
        "floor" => arity(method, args, 0).map(|()| Value::Float(x.floor())),
        "ceil" => arity(method, args, 0).map(|()| Value::Float(x.ceil())),
        "round" => arity(method, args, 0).and_then(|()| to_int(x.round(), "round")),
        "toInteger" | "intValue" => arity(method, args, 0).and_then(|()| to_int(x.trunc(), "toInteger")),
        "toDouble" | "toFloat" => arity(method, args, 0).map(|()| Value::Float(x)),
        "isNaN" => arity(method, args, 0).map(|()| Value::Bool(x.is_nan())),
        _ => return None,
    };
    Some(result)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "range is checked before the cast"
)]
fn to_int(x: f64, operation: &str) -> EvalResult {
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(Value::Int(x as i64))
    } else {
        Err(integer_overflow(operation))
    }
}
