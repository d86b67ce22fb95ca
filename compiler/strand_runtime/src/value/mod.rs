//! Runtime values.
//!
//! Heap payloads are behind `Arc`, so cloning a value is cheap and values can
//! move freely between the threads that share an engine.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use strand_ir::QualifiedName;

use crate::context::ContextRef;
use crate::errors::EvalResult;
use crate::output::OutputSink;
use crate::session::Invocation;

/// Something that can be called with positional arguments: script functions,
/// closures, and native functions registered by the embedder.
pub trait Callable: Send + Sync {
    fn name(&self) -> &str;

    fn call(&self, args: &[Value], inv: &Invocation) -> EvalResult;

    /// Declared parameter count, when known. Collection methods use it to
    /// decide between passing a map entry or a key and a value.
    fn arity(&self) -> Option<usize> {
        None
    }
}

/// An embedder-supplied object whose methods scripts can call.
///
/// `invoke` returns `None` when the object has no such method, which lets the
/// dispatch chain try its fallback tiers.
pub trait HostObject: Send + Sync {
    fn type_name(&self) -> &str;

    fn invoke(&self, method: &str, args: &[Value], inv: &Invocation) -> Option<EvalResult>;

    /// Read a property (`obj.name` without parentheses).
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Text used when the object is printed or concatenated.
    fn describe(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

/// Native function adapter for [`Callable`].
pub struct NativeFunction<F> {
    name: String,
    func: F,
}

impl<F> NativeFunction<F>
where
    F: Fn(&[Value], &Invocation) -> EvalResult + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        NativeFunction {
            name: name.into(),
            func,
        }
    }
}

impl<F> Callable for NativeFunction<F>
where
    F: Fn(&[Value], &Invocation) -> EvalResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &[Value], inv: &Invocation) -> EvalResult {
        (self.func)(args, inv)
    }
}

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    /// Map with string keys, iterated in key order.
    Map(Arc<BTreeMap<String, Value>>),
    /// Imported enum constant, owner by simple name.
    Enum(QualifiedName),
    /// Reference to an imported type; method calls go to its native handler.
    Type(Arc<str>),
    Callable(Arc<dyn Callable>),
    Host(Arc<dyn HostObject>),
    /// The synthetic `out` name.
    Output(OutputSink),
    /// The synthetic `context` name.
    Context(ContextRef),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn map(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(Arc::new(entries))
    }

    pub fn callable(callable: impl Callable + 'static) -> Self {
        Value::Callable(Arc::new(callable))
    }

    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Arc::new(object))
    }

    /// Wrap a closure as a callable value.
    pub fn native<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value], &Invocation) -> EvalResult + Send + Sync + 'static,
    {
        Value::callable(NativeFunction::new(name, func))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Enum(_) => "enum",
            Value::Type(_) => "type",
            Value::Callable(_) => "function",
            Value::Host(host) => host.type_name(),
            Value::Output(_) => "output",
            Value::Context(_) => "context",
        }
    }

    /// Script truthiness: null, false, zero and empty collections are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            _ => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Arc<dyn Callable>> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Ordering for numbers (across int and float) and strings.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => int_to_float(*a).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&int_to_float(*b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[allow(clippy::cast_precision_loss, reason = "int to float promotion in mixed arithmetic")]
pub fn int_to_float(n: i64) -> f64 {
    n as f64
}

fn same_object<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                int_to_float(*a) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => same_object(a, b),
            (Value::Host(a), Value::Host(b)) => same_object(a, b),
            (Value::Output(a), Value::Output(b)) => a.ptr_eq(b),
            (Value::Context(a), Value::Context(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                if entries.is_empty() {
                    return write!(f, "[:]");
                }
                write!(f, "[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                write!(f, "]")
            }
            Value::Enum(name) => write!(f, "{}", name.member()),
            Value::Type(name) => write!(f, "{name}"),
            Value::Callable(c) => write!(f, "<function {}>", c.name()),
            Value::Host(host) => write!(f, "{}", host.describe()),
            Value::Output(_) => write!(f, "<out>"),
            Value::Context(_) => write!(f, "<context>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Enum(name) => write!(f, "Enum({name})"),
            Value::Type(name) => write!(f, "Type({name})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            other => write!(f, "{other}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
