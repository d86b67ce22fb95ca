//! Interpreter-mode promotion of call-local bindings into session state.
//!
//! In interpreter mode the backend records every top-level local it assigns
//! into the context's collection slot. After a successful top-level
//! execution, [`promote`] drains that slot: callables are registered in the
//! session namespace, and every value becomes a session binding. Promotion is
//! never run after a failed execution.

use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::namespace::SessionNamespace;
use crate::value::Value;

/// What a promotion pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Promotion {
    /// Names written to session bindings, in assignment order.
    pub bindings: Vec<String>,
    /// Names also registered as session functions.
    pub functions: Vec<String>,
}

/// Drain the collection slot into the session. Returns `None` when the
/// context was not collecting.
pub fn promote(ctx: &EvaluationContext, namespace: &SessionNamespace) -> Option<Promotion> {
    let collected = ctx.take_collected()?;
    let mut promotion = Promotion::default();
    for (name, value) in collected {
        if let Value::Callable(callable) = &value {
            namespace.register(name.clone(), Arc::clone(callable));
            promotion.functions.push(name.clone());
        }
        ctx.session().set(name.clone(), value);
        promotion.bindings.push(name);
    }
    tracing::debug!(
        bindings = promotion.bindings.len(),
        functions = promotion.functions.len(),
        "promoted interpreter-mode locals"
    );
    Some(promotion)
}
