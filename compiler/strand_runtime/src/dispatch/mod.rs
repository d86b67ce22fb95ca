//! Call dispatch chain.
//!
//! A Chain of Responsibility over three tiers, tried in priority order until
//! one handles the call:
//!
//! 1. `DirectResolver` (priority 0): a method on the receiver itself. Host
//!    objects, built-in methods of primitive values, the output sink, the
//!    context, callables (`call`) and imported types.
//! 2. `NamespaceResolver` (priority 1): a function in the session namespace.
//! 3. `ScopeCallableResolver` (priority 2): a callable value bound under the
//!    call's name in scope.
//!
//! If no tier handles the call it fails with an unresolved-call error. A tier
//! that finds the target but fails while running it propagates that error;
//! the chain does not fall through on failure.

mod direct;
mod fallback;

pub use direct::DirectResolver;
pub use fallback::{NamespaceResolver, ScopeCallableResolver};

use std::sync::Arc;

use crate::errors::{unresolved_call, EvalResult};
use crate::session::Invocation;
use crate::value::Value;

/// The call being dispatched.
#[derive(Clone, Copy, Debug)]
pub struct CallSite<'a> {
    pub receiver: Option<&'a Value>,
    pub name: &'a str,
    pub args: &'a [Value],
}

/// Outcome of asking one tier.
#[derive(Debug)]
pub enum Resolution {
    /// The tier found the target and ran it.
    Handled(EvalResult),
    /// Not this tier's call.
    NotFound,
}

impl From<Option<EvalResult>> for Resolution {
    fn from(result: Option<EvalResult>) -> Self {
        result.map_or(Resolution::NotFound, Resolution::Handled)
    }
}

/// One tier of the dispatch chain.
pub trait CallResolver {
    fn resolve(&self, site: &CallSite<'_>, inv: &Invocation) -> Resolution;

    /// Lower runs first.
    fn priority(&self) -> u8;

    /// Name used in trace output.
    fn name(&self) -> &'static str;
}

/// The fixed set of tiers.
#[derive(Clone, Debug)]
pub enum CallResolverKind {
    Direct(DirectResolver),
    Namespace(NamespaceResolver),
    ScopeCallable(ScopeCallableResolver),
}

impl CallResolverKind {
    pub fn resolve(&self, site: &CallSite<'_>, inv: &Invocation) -> Resolution {
        match self {
            Self::Direct(r) => r.resolve(site, inv),
            Self::Namespace(r) => r.resolve(site, inv),
            Self::ScopeCallable(r) => r.resolve(site, inv),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Self::Direct(r) => r.priority(),
            Self::Namespace(r) => r.priority(),
            Self::ScopeCallable(r) => r.priority(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct(r) => r.name(),
            Self::Namespace(r) => r.name(),
            Self::ScopeCallable(r) => r.name(),
        }
    }
}

/// Tiers sorted by priority; cloning shares the list.
#[derive(Clone, Debug)]
pub struct DispatchChain {
    resolvers: Arc<Vec<CallResolverKind>>,
}

impl DispatchChain {
    pub fn new(mut resolvers: Vec<CallResolverKind>) -> Self {
        resolvers.sort_by_key(CallResolverKind::priority);
        DispatchChain {
            resolvers: Arc::new(resolvers),
        }
    }

    /// Direct, then namespace, then scope-resolved callable.
    pub fn standard() -> Self {
        Self::new(vec![
            CallResolverKind::Direct(DirectResolver),
            CallResolverKind::Namespace(NamespaceResolver),
            CallResolverKind::ScopeCallable(ScopeCallableResolver),
        ])
    }

    /// Tier names in the order they are tried.
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(CallResolverKind::name).collect()
    }

    #[tracing::instrument(
        level = "trace",
        skip(self, receiver, args, inv),
        fields(receiver = receiver.map(|r| r.type_name()))
    )]
    pub fn invoke(
        &self,
        receiver: Option<&Value>,
        name: &str,
        args: &[Value],
        inv: &Invocation,
    ) -> EvalResult {
        let site = CallSite {
            receiver,
            name,
            args,
        };
        for resolver in self.resolvers.iter() {
            if let Resolution::Handled(result) = resolver.resolve(&site, inv) {
                tracing::trace!(tier = resolver.name(), "call resolved");
                return result;
            }
        }
        Err(unresolved_call(name, receiver.map(Value::type_name)))
    }
}
