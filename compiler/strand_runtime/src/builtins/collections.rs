//! List and map methods, including the closure-taking iteration methods.
//!
//! Collections are immutable values: methods that "modify" return a new
//! collection.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{arg, arity, callable_arg, int_arg, str_arg};
use crate::errors::{
    index_out_of_bounds, integer_overflow, invalid_binary_op, type_mismatch, EvalError,
    EvalResult,
};
use crate::session::Invocation;
use crate::value::{int_to_float, Callable, Value};

pub(super) fn list_call(
    items: &Arc<Vec<Value>>,
    method: &str,
    args: &[Value],
    inv: &Invocation,
) -> Option<EvalResult> {
    let result = match method {
        "size" => arity(method, args, 0).and_then(|()| len(items.len())),
        "isEmpty" => arity(method, args, 0).map(|()| Value::Bool(items.is_empty())),
        "first" => arity(method, args, 0).and_then(|()| element(items, 0)),
        "last" => arity(method, args, 0).and_then(|()| element(items, -1)),
        "get" => int_arg(method, args, 0).and_then(|i| element(items, i)),
        "contains" => arg(method, args, 0).map(|v| Value::Bool(items.contains(v))),
        "indexOf" => arg(method, args, 0).and_then(|v| match items.iter().position(|x| x == v) {
            Some(i) => len(i),
            None => Ok(Value::Int(-1)),
        }),
        "plus" => arg(method, args, 0).map(|other| {
            let mut out = items.as_ref().clone();
            match other {
                Value::List(more) => out.extend(more.iter().cloned()),
                single => out.push(single.clone()),
            }
            Value::list(out)
        }),
        "reverse" => arity(method, args, 0).map(|()| {
            Value::list(items.iter().rev().cloned().collect())
        }),
        "join" => {
            let sep = if args.is_empty() {
                Ok("")
            } else {
                str_arg(method, args, 0)
            };
            sep.map(|sep| {
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                Value::from(parts.join(sep))
            })
        }
        "subList" => arity(method, args, 2).and_then(|()| {
            let from = index_arg(method, args, 0)?;
            let to = index_arg(method, args, 1)?;
            if from > to || to > items.len() {
                return Err(index_out_of_bounds(i64::try_from(to).unwrap_or(i64::MAX)));
            }
            Ok(Value::list(items[from..to].to_vec()))
        }),
        "sort" => arity(method, args, 0).and_then(|()| sorted(items)),
        "sum" => arity(method, args, 0).and_then(|()| sum(items)),
        "max" => arity(method, args, 0).and_then(|()| extreme(items, Ordering::Greater)),
        "min" => arity(method, args, 0).and_then(|()| extreme(items, Ordering::Less)),
        "each" => callable_arg(method, args, 0).and_then(|f| {
            for item in items.iter() {
                inv.call(f, std::slice::from_ref(item))?;
            }
            Ok(Value::List(Arc::clone(items)))
        }),
        "eachWithIndex" => callable_arg(method, args, 0).and_then(|f| {
            for (i, item) in items.iter().enumerate() {
                inv.call(f, &[item.clone(), len(i)?])?;
            }
            Ok(Value::List(Arc::clone(items)))
        }),
        "collect" => callable_arg(method, args, 0).and_then(|f| {
            items
                .iter()
                .map(|item| inv.call(f, std::slice::from_ref(item)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::list)
        }),
        "findAll" => callable_arg(method, args, 0).and_then(|f| {
            let mut kept = Vec::new();
            for item in items.iter() {
                if inv.call(f, std::slice::from_ref(item))?.is_truthy() {
                    kept.push(item.clone());
                }
            }
            Ok(Value::list(kept))
        }),
        "find" => callable_arg(method, args, 0).and_then(|f| {
            for item in items.iter() {
                if inv.call(f, std::slice::from_ref(item))?.is_truthy() {
                    return Ok(item.clone());
                }
            }
            Ok(Value::Null)
        }),
        "any" => callable_arg(method, args, 0).and_then(|f| {
            for item in items.iter() {
                if inv.call(f, std::slice::from_ref(item))?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }),
        "every" => callable_arg(method, args, 0).and_then(|f| {
            for item in items.iter() {
                if !inv.call(f, std::slice::from_ref(item))?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }),
        "inject" => arity(method, args, 2).and_then(|()| {
            let f = callable_arg(method, args, 1)?;
            let mut acc = args[0].clone();
            for item in items.iter() {
                acc = inv.call(f, &[acc, item.clone()])?;
            }
            Ok(acc)
        }),
        _ => return None,
    };
    Some(result)
}

pub(super) fn map_call(
    entries: &Arc<BTreeMap<String, Value>>,
    method: &str,
    args: &[Value],
    inv: &Invocation,
) -> Option<EvalResult> {
    let result = match method {
        "size" => arity(method, args, 0).and_then(|()| len(entries.len())),
        "isEmpty" => arity(method, args, 0).map(|()| Value::Bool(entries.is_empty())),
        "get" => str_arg(method, args, 0).map(|k| entries.get(k).cloned().unwrap_or(Value::Null)),
        "containsKey" => str_arg(method, args, 0).map(|k| Value::Bool(entries.contains_key(k))),
        "keySet" | "keys" => arity(method, args, 0).map(|()| {
            Value::list(entries.keys().map(|k| Value::from(k.as_str())).collect())
        }),
        "values" => arity(method, args, 0).map(|()| Value::list(entries.values().cloned().collect())),
        "plus" => arg(method, args, 0).and_then(|other| match other {
            Value::Map(more) => {
                let mut merged = entries.as_ref().clone();
                merged.extend(more.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(Value::map(merged))
            }
            other => Err(type_mismatch("map", other.type_name())),
        }),
        "each" => callable_arg(method, args, 0).and_then(|f| {
            for (key, value) in entries.iter() {
                inv.call(f, &entry_args(f, key, value))?;
            }
            Ok(Value::Map(Arc::clone(entries)))
        }),
        "collect" => callable_arg(method, args, 0).and_then(|f| {
            entries
                .iter()
                .map(|(key, value)| inv.call(f, &entry_args(f, key, value)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::list)
        }),
        "findAll" => callable_arg(method, args, 0).and_then(|f| {
            let mut kept = BTreeMap::new();
            for (key, value) in entries.iter() {
                if inv.call(f, &entry_args(f, key, value))?.is_truthy() {
                    kept.insert(key.clone(), value.clone());
                }
            }
            Ok(Value::map(kept))
        }),
        _ => return None,
    };
    Some(result)
}

// A one-parameter closure receives the entry as a map; otherwise key and value.
fn entry_args(f: &Arc<dyn Callable>, key: &str, value: &Value) -> Vec<Value> {
    if f.arity() == Some(1) {
        let mut entry = BTreeMap::new();
        entry.insert("key".to_string(), Value::from(key));
        entry.insert("value".to_string(), value.clone());
        vec![Value::map(entry)]
    } else {
        vec![Value::from(key), value.clone()]
    }
}

fn len(n: usize) -> EvalResult {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| integer_overflow("size"))
}

fn index_arg(method: &str, args: &[Value], index: usize) -> Result<usize, EvalError> {
    let i = int_arg(method, args, index)?;
    usize::try_from(i).map_err(|_| index_out_of_bounds(i))
}

// Negative indices count from the end.
fn element(items: &[Value], index: i64) -> EvalResult {
    let len = i64::try_from(items.len()).map_err(|_| integer_overflow("index"))?;
    let resolved = if index < 0 { len + index } else { index };
    usize::try_from(resolved)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| index_out_of_bounds(index))
}

fn sorted(items: &[Value]) -> EvalResult {
    let mut out = items.to_vec();
    let mut failure = None;
    out.sort_by(|a, b| {
        a.compare(b).unwrap_or_else(|| {
            failure.get_or_insert_with(|| invalid_binary_op("<=>", a.type_name(), b.type_name()));
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(Value::list(out)),
    }
}

fn sum(items: &[Value]) -> EvalResult {
    let mut acc = Value::Int(0);
    for item in items {
        acc = match (&acc, item) {
            (Value::Int(a), Value::Int(b)) => {
                Value::Int(a.checked_add(*b).ok_or_else(|| integer_overflow("sum"))?)
            }
            (Value::Int(a), Value::Float(b)) => Value::Float(int_to_float(*a) + b),
            (Value::Float(a), Value::Int(b)) => Value::Float(a + int_to_float(*b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (_, other) => return Err(type_mismatch("number", other.type_name())),
        };
    }
    Ok(acc)
}

fn extreme(items: &[Value], wanted: Ordering) -> EvalResult {
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            None => Some(item),
            Some(current) => match item.compare(current) {
                Some(ordering) if ordering == wanted => Some(item),
                Some(_) => Some(current),
                None => {
                    return Err(invalid_binary_op(
                        "<=>",
                        item.type_name(),
                        current.type_name(),
                    ))
                }
            },
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}
