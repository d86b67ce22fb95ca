//! Session state shared across evaluations, and the per-call [`Invocation`]
//! handed to compiled units and callables.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::context::{EvaluationContext, SessionBindings};
use crate::dispatch::DispatchChain;
use crate::errors::{interrupted, not_callable, recursion_limit_exceeded, EvalError, EvalResult};
use crate::namespace::SessionNamespace;
use crate::scope::{self, AssignTarget};
use crate::stack::ensure_sufficient_stack;
use crate::value::{Callable, HostObject, Value};

/// Default bound on nested calls within one evaluation.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Native handlers for imported types.
///
/// A method call on `Value::Type("P")` is forwarded to the handler registered
/// for `P`.
#[derive(Default)]
pub struct NativeRegistry {
    types: DashMap<String, Arc<dyn HostObject>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&self, name: impl Into<String>, handler: Arc<dyn HostObject>) {
        self.types.insert(name.into(), handler);
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn HostObject>> {
        self.types.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn clear(&self) {
        self.types.clear();
    }
}

/// State owned by one engine and shared by all of its evaluations.
pub struct Session {
    namespace: SessionNamespace,
    bindings: SessionBindings,
    natives: NativeRegistry,
    dispatch: DispatchChain,
    max_call_depth: usize,
}

impl Session {
    pub fn new() -> Self {
        Session {
            namespace: SessionNamespace::new(),
            bindings: SessionBindings::new(),
            natives: NativeRegistry::new(),
            dispatch: DispatchChain::standard(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn namespace(&self) -> &SessionNamespace {
        &self.namespace
    }

    pub fn bindings(&self) -> &SessionBindings {
        &self.bindings
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    pub fn dispatch(&self) -> &DispatchChain {
        &self.dispatch
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("namespace", &self.namespace)
            .field("bindings", &self.bindings.names())
            .field("max_call_depth", &self.max_call_depth)
            .finish_non_exhaustive()
    }
}

/// Cooperative cancellation flag for one evaluation.
///
/// Backends check it at loop iterations and calls; setting it from another
/// thread makes the running script fail with `Interrupted`.
#[derive(Clone, Debug, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Everything a running unit needs: the call's context, the engine session,
/// the interrupt flag, and the current call depth.
///
/// One `Invocation` serves one top-level evaluation on one thread.
pub struct Invocation {
    context: EvaluationContext,
    session: Arc<Session>,
    interrupt: InterruptHandle,
    depth: Cell<usize>,
}

impl Invocation {
    pub fn new(context: EvaluationContext, session: Arc<Session>) -> Self {
        Invocation {
            context,
            session,
            interrupt: InterruptHandle::new(),
            depth: Cell::new(0),
        }
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Resolve a non-local name through the scope resolver.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        scope::resolve(&self.context, name)
    }

    /// Assign a non-local name through the scope resolver.
    pub fn assign(&self, name: &str, value: Value) -> AssignTarget {
        scope::assign(&self.context, name, value)
    }

    /// Method or function call through the dispatch chain.
    pub fn invoke(&self, receiver: Option<&Value>, name: &str, args: &[Value]) -> EvalResult {
        self.session.dispatch.invoke(receiver, name, args, self)
    }

    /// Call a callable, tracking depth and honoring the interrupt flag.
    pub fn call(&self, callable: &Arc<dyn Callable>, args: &[Value]) -> EvalResult {
        let _guard = self.enter()?;
        ensure_sufficient_stack(|| callable.call(args, self))
    }

    /// Call any value; only callables succeed.
    pub fn call_value(&self, callee: &Value, args: &[Value]) -> EvalResult {
        match callee {
            Value::Callable(callable) => self.call(callable, args),
            other => Err(not_callable(other.type_name())),
        }
    }

    pub fn check_interrupt(&self) -> Result<(), EvalError> {
        if self.interrupt.is_interrupted() {
            Err(interrupted())
        } else {
            Ok(())
        }
    }

    /// Enter one call level. The returned guard leaves it on drop.
    pub fn enter(&self) -> Result<CallGuard<'_>, EvalError> {
        self.check_interrupt()?;
        let depth = self.depth.get();
        if depth >= self.session.max_call_depth {
            return Err(recursion_limit_exceeded(self.session.max_call_depth));
        }
        self.depth.set(depth + 1);
        Ok(CallGuard { depth: &self.depth })
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("context", &self.context)
            .field("depth", &self.depth.get())
            .finish_non_exhaustive()
    }
}

/// Leaves a call level on drop.
pub struct CallGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}
