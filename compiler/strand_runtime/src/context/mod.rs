//! Per-call evaluation context and session-scoped bindings.
//!
//! An [`EvaluationContext`] lives for one top-level evaluation. It owns the
//! call-local bindings and holds a handle on the engine's
//! [`SessionBindings`]. Writes to session names made during the call are
//! staged on the context and only reach the session through
//! [`EvaluationContext::commit`], so a failed evaluation leaves session state
//! untouched.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::output::OutputSink;
use crate::shared::SharedMutable;
use crate::value::Value;

/// Session-scoped bindings shared by every evaluation on one engine.
#[derive(Clone, Debug, Default)]
pub struct SessionBindings(SharedMutable<FxHashMap<String, Value>>);

impl SessionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.write().insert(name.into(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.0.write().remove(name)
    }

    pub fn clear(&self) {
        self.0.write().clear();
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Sorted binding names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Copy of every binding, for snapshot comparisons.
    pub fn snapshot(&self) -> FxHashMap<String, Value> {
        self.0.read().clone()
    }

    fn apply(&self, staged: FxHashMap<String, Value>) {
        if staged.is_empty() {
            return;
        }
        self.0.write().extend(staged);
    }
}

/// Locals recorded by the backend in interpreter mode, in assignment order.
pub type CollectedLocals = Vec<(String, Value)>;

struct ContextState {
    locals: RwLock<FxHashMap<String, Value>>,
    staged: RwLock<FxHashMap<String, Value>>,
    session: SessionBindings,
    output: OutputSink,
    collected: Mutex<Option<CollectedLocals>>,
}

/// Per-call evaluation state. Clones share the same call.
#[derive(Clone)]
pub struct EvaluationContext {
    state: Arc<ContextState>,
}

impl EvaluationContext {
    pub fn new(session: SessionBindings, output: OutputSink) -> Self {
        EvaluationContext {
            state: Arc::new(ContextState {
                locals: RwLock::new(FxHashMap::default()),
                staged: RwLock::new(FxHashMap::default()),
                session,
                output,
                collected: Mutex::new(None),
            }),
        }
    }

    /// Context over a fresh, private session. Useful for tests and one-off
    /// evaluations.
    pub fn detached() -> Self {
        Self::new(SessionBindings::new(), OutputSink::silent())
    }

    /// Seed a call-local binding.
    #[must_use]
    pub fn with_local(self, name: impl Into<String>, value: Value) -> Self {
        self.set_local(name, value);
        self
    }

    pub fn output(&self) -> &OutputSink {
        &self.state.output
    }

    pub fn session(&self) -> &SessionBindings {
        &self.state.session
    }

    // Call-local bindings

    pub fn local(&self, name: &str) -> Option<Value> {
        self.state.locals.read().get(name).cloned()
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.state.locals.read().contains_key(name)
    }

    pub fn set_local(&self, name: impl Into<String>, value: Value) {
        self.state.locals.write().insert(name.into(), value);
    }

    pub fn remove_local(&self, name: &str) -> Option<Value> {
        self.state.locals.write().remove(name)
    }

    /// Sorted names of every call-local binding.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.locals.read().keys().cloned().collect();
        names.sort();
        names
    }

    // Session bindings, as seen from this call

    /// Session value including writes staged by this call.
    pub fn session_value(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.state.staged.read().get(name) {
            return Some(value.clone());
        }
        self.state.session.get(name)
    }

    pub fn has_session_value(&self, name: &str) -> bool {
        self.state.staged.read().contains_key(name) || self.state.session.contains(name)
    }

    /// Stage a session write; visible to this call immediately, to others
    /// after [`EvaluationContext::commit`].
    pub fn stage_session_write(&self, name: impl Into<String>, value: Value) {
        self.state.staged.write().insert(name.into(), value);
    }

    /// Publish staged session writes. Called once the top-level execution
    /// has succeeded.
    pub fn commit(&self) {
        let staged = std::mem::take(&mut *self.state.staged.write());
        self.state.session.apply(staged);
    }

    /// Drop staged session writes.
    pub fn discard_staged(&self) {
        self.state.staged.write().clear();
    }

    // Interpreter-mode collection slot

    /// Open the collection slot. Local assignments recorded from now on are
    /// candidates for promotion.
    pub fn begin_collection(&self) {
        *self.state.collected.lock() = Some(CollectedLocals::new());
    }

    pub fn is_collecting(&self) -> bool {
        self.state.collected.lock().is_some()
    }

    /// Record a top-level local assignment. No-op unless collecting; a later
    /// write to the same name replaces the earlier one in place.
    pub fn collect_local(&self, name: &str, value: Value) {
        let mut slot = self.state.collected.lock();
        let Some(collected) = slot.as_mut() else {
            return;
        };
        match collected.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value,
            None => collected.push((name.to_string(), value)),
        }
    }

    /// Remove the collection slot and return what it held.
    pub fn take_collected(&self) -> Option<CollectedLocals> {
        self.state.collected.lock().take()
    }

    /// Weak handle for the synthetic `context` name.
    pub fn downgrade(&self) -> ContextRef {
        ContextRef(Arc::downgrade(&self.state))
    }

    pub fn ptr_eq(&self, other: &EvaluationContext) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("locals", &self.local_names())
            .field("output", &self.state.output)
            .finish_non_exhaustive()
    }
}

/// Non-owning handle on an [`EvaluationContext`].
///
/// Held by `Value::Context` so a script storing `context` somewhere
/// long-lived does not keep the call's state alive.
#[derive(Clone)]
pub struct ContextRef(Weak<ContextState>);

impl ContextRef {
    /// The context, if its call is still running.
    pub fn upgrade(&self) -> Option<EvaluationContext> {
        self.0.upgrade().map(|state| EvaluationContext { state })
    }

    pub fn ptr_eq(&self, other: &ContextRef) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests;
