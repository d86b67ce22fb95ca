//! Built-in methods for primitive values, the output sink and the context.
//!
//! Each entry point returns `None` when the method does not exist, so the
//! dispatch chain can move on to its fallback tiers.

mod collections;
mod numeric;
mod string;

use crate::context::ContextRef;
use crate::errors::{host_failure, wrong_arg_count, wrong_arg_type, EvalError, EvalResult};
use crate::output::OutputSink;
use crate::scope;
use crate::session::Invocation;
use crate::value::{Callable, Value};
use std::sync::Arc;

/// Methods of strings, lists, maps, numbers, booleans and enum constants.
pub fn value_method(
    receiver: &Value,
    method: &str,
    args: &[Value],
    inv: &Invocation,
) -> Option<EvalResult> {
    let specific = match receiver {
        Value::Str(s) => string::call(s, method, args),
        Value::List(items) => collections::list_call(items, method, args, inv),
        Value::Map(entries) => collections::map_call(entries, method, args, inv),
        Value::Int(n) => numeric::int_call(*n, method, args, inv),
        Value::Float(x) => numeric::float_call(*x, method, args),
        Value::Enum(name) if method == "name" => Some(Ok(Value::from(name.member()))),
        _ => None,
    };
    specific.or_else(|| common(receiver, method, args))
}

fn common(receiver: &Value, method: &str, args: &[Value]) -> Option<EvalResult> {
    if receiver.is_null() {
        return None;
    }
    match method {
        "toString" => Some(arity(method, args, 0).map(|()| Value::from(receiver.to_string()))),
        "equals" => Some(arity(method, args, 1).map(|()| Value::Bool(*receiver == args[0]))),
        _ => None,
    }
}

/// `out.print(x)`, `out.println(x)`, `out.flush()`.
pub fn output_method(sink: &OutputSink, method: &str, args: &[Value]) -> Option<EvalResult> {
    let written = match method {
        "print" => {
            let text = args.iter().map(Value::to_string).collect::<String>();
            sink.print(&text)
        }
        "println" => {
            let text = args.iter().map(Value::to_string).collect::<String>();
            sink.println(&text)
        }
        "flush" => sink.flush(),
        _ => return None,
    };
    Some(
        written
            .map(|()| Value::Null)
            .map_err(|e| host_failure(format!("output: {e}"))),
    )
}

/// `context.get(name)`, `context.set(name, value)`, `context.contains(name)`,
/// `context.remove(name)`, `context.names()`.
pub fn context_method(handle: &ContextRef, method: &str, args: &[Value]) -> Option<EvalResult> {
    if !matches!(method, "get" | "set" | "contains" | "remove" | "names") {
        return None;
    }
    let Some(ctx) = handle.upgrade() else {
        return Some(Err(EvalError::new(
            "context is no longer active; its evaluation has finished",
        )));
    };
    let result = match method {
        "get" => str_arg(method, args, 0)
            .map(|name| scope::resolve(&ctx, name).unwrap_or(Value::Null)),
        "set" => arity(method, args, 2).and_then(|()| {
            let name = str_arg(method, args, 0)?;
            scope::assign(&ctx, name, args[1].clone());
            Ok(Value::Null)
        }),
        "contains" => str_arg(method, args, 0).map(|name| Value::Bool(scope::is_bound(&ctx, name))),
        "remove" => str_arg(method, args, 0)
            .map(|name| ctx.remove_local(name).unwrap_or(Value::Null)),
        _ => Ok(Value::list(
            ctx.local_names().into_iter().map(Value::from).collect(),
        )),
    };
    Some(result)
}

// Argument helpers

fn arity(method: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(wrong_arg_count(method, expected, args.len()))
    }
}

fn arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a Value, EvalError> {
    args.get(index)
        .ok_or_else(|| wrong_arg_count(method, index + 1, args.len()))
}

fn str_arg<'a>(method: &str, args: &'a [Value], index: usize) -> Result<&'a str, EvalError> {
    arg(method, args, index)?
        .as_str()
        .ok_or_else(|| wrong_arg_type(method, "str"))
}

fn int_arg(method: &str, args: &[Value], index: usize) -> Result<i64, EvalError> {
    arg(method, args, index)?
        .as_int()
        .ok_or_else(|| wrong_arg_type(method, "int"))
}

fn callable_arg<'a>(
    method: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a Arc<dyn Callable>, EvalError> {
    arg(method, args, index)?
        .as_callable()
        .ok_or_else(|| wrong_arg_type(method, "function"))
}
