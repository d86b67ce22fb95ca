//! Scope resolution for names that are not script locals.
//!
//! # Resolution Order
//!
//! 1. Call-local binding
//! 2. Session-scoped binding (including writes staged by this call)
//! 3. `out`: the call's output sink
//! 4. `context`: the evaluation context itself
//! 5. Unbound
//!
//! Assignment writes the call-local scope, unless the name already exists in
//! session scope, in which case the session copy is updated.

use crate::context::EvaluationContext;
use crate::value::Value;

/// Synthetic name bound to the call's output sink.
pub const OUT: &str = "out";

/// Synthetic name bound to the evaluation context.
pub const CONTEXT: &str = "context";

/// Where an assignment landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssignTarget {
    Local,
    Session,
}

/// Resolve `name` against the layered scopes.
pub fn resolve(ctx: &EvaluationContext, name: &str) -> Option<Value> {
    if let Some(value) = ctx.local(name) {
        return Some(value);
    }
    if let Some(value) = ctx.session_value(name) {
        return Some(value);
    }
    match name {
        OUT => Some(Value::Output(ctx.output().clone())),
        CONTEXT => Some(Value::Context(ctx.downgrade())),
        _ => None,
    }
}

/// Whether `name` resolves to anything.
pub fn is_bound(ctx: &EvaluationContext, name: &str) -> bool {
    ctx.has_local(name) || ctx.has_session_value(name) || name == OUT || name == CONTEXT
}

/// Assign `name` in the scope that owns it.
pub fn assign(ctx: &EvaluationContext, name: &str, value: Value) -> AssignTarget {
    if ctx.has_session_value(name) && !ctx.has_local(name) {
        ctx.stage_session_write(name, value);
        AssignTarget::Session
    } else {
        ctx.set_local(name, value);
        AssignTarget::Local
    }
}
