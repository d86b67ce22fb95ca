//! String methods. Indices count characters, not bytes.

use super::{arg, arity, int_arg, str_arg};
use crate::errors::{index_out_of_bounds, integer_overflow, EvalError, EvalResult};
use crate::value::Value;

pub(super) fn call(s: &str, method: &str, args: &[Value]) -> Option<EvalResult> {
    let result = match method {
        "size" | "length" => arity(method, args, 0).and_then(|()| char_count(s)),
        "isEmpty" => arity(method, args, 0).map(|()| Value::Bool(s.is_empty())),
        "toUpperCase" => arity(method, args, 0).map(|()| Value::from(s.to_uppercase())),
        "toLowerCase" => arity(method, args, 0).map(|()| Value::from(s.to_lowercase())),
        "trim" => arity(method, args, 0).map(|()| Value::from(s.trim())),
        "reverse" => arity(method, args, 0).map(|()| Value::from(s.chars().rev().collect::<String>())),
        "contains" => str_arg(method, args, 0).map(|needle| Value::Bool(s.contains(needle))),
        "startsWith" => str_arg(method, args, 0).map(|p| Value::Bool(s.starts_with(p))),
        "endsWith" => str_arg(method, args, 0).map(|p| Value::Bool(s.ends_with(p))),
        "indexOf" => str_arg(method, args, 0).and_then(|needle| index_of(s, needle)),
        "split" => str_arg(method, args, 0).map(|sep| {
            Value::list(s.split(sep).map(Value::from).collect())
        }),
        "replace" => arity(method, args, 2).and_then(|()| {
            let from = str_arg(method, args, 0)?;
            let to = str_arg(method, args, 1)?;
            Ok(Value::from(s.replace(from, to)))
        }),
        "substring" => substring(s, method, args),
        "plus" => arg(method, args, 0).map(|other| Value::from(format!("{s}{other}"))),
        "multiply" => int_arg(method, args, 0).and_then(|n| repeat(s, n)),
        "toInteger" => arity(method, args, 0).and_then(|()| {
            s.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EvalError::new(format!("'{s}' is not an integer")))
        }),
        "toDouble" | "toFloat" => arity(method, args, 0).and_then(|()| {
            s.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| EvalError::new(format!("'{s}' is not a number")))
        }),
        _ => return None,
    };
    Some(result)
}

fn char_count(s: &str) -> EvalResult {
    i64::try_from(s.chars().count())
        .map(Value::Int)
        .map_err(|_| integer_overflow("size"))
}

fn index_of(s: &str, needle: &str) -> EvalResult {
    let Some(byte_index) = s.find(needle) else {
        return Ok(Value::Int(-1));
    };
    i64::try_from(s[..byte_index].chars().count())
        .map(Value::Int)
        .map_err(|_| integer_overflow("indexOf"))
}

fn substring(s: &str, method: &str, args: &[Value]) -> EvalResult {
    let len = s.chars().count();
    let start = int_arg(method, args, 0)?;
    let end = if args.len() > 1 {
        int_arg(method, args, 1)?
    } else {
        i64::try_from(len).map_err(|_| integer_overflow(method))?
    };
    let start_idx = usize::try_from(start).map_err(|_| index_out_of_bounds(start))?;
    let end_idx = usize::try_from(end).map_err(|_| index_out_of_bounds(end))?;
    if start_idx > end_idx || end_idx > len {
        return Err(index_out_of_bounds(end));
    }
    Ok(Value::from(
        s.chars()
            .skip(start_idx)
            .take(end_idx - start_idx)
            .collect::<String>(),
    ))
}

fn repeat(s: &str, n: i64) -> EvalResult {
    let count = usize::try_from(n).map_err(|_| EvalError::new("cannot repeat a string a negative number of times"))?;
    Ok(Value::from(s.repeat(count)))
}
