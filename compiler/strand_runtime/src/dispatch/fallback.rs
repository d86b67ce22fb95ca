//! Fallback tiers: session namespace, then a callable bound in scope.

use super::{CallResolver, CallSite, Resolution};
use crate::session::Invocation;
use crate::value::Value;

/// Looks the call name up in the session namespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct NamespaceResolver;

impl CallResolver for NamespaceResolver {
    fn resolve(&self, site: &CallSite<'_>, inv: &Invocation) -> Resolution {
        match inv.session().namespace().lookup(site.name) {
            Some(callable) => Resolution::Handled(inv.call(&callable, site.args)),
            None => Resolution::NotFound,
        }
    }

    fn priority(&self) -> u8 {
        1
    }

    fn name(&self) -> &'static str {
        "namespace"
    }
}

/// Resolves the call name through the scope resolver and calls the result if
/// it is callable.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScopeCallableResolver;

impl CallResolver for ScopeCallableResolver {
    fn resolve(&self, site: &CallSite<'_>, inv: &Invocation) -> Resolution {
        match inv.resolve(site.name) {
            Some(Value::Callable(callable)) => Resolution::Handled(inv.call(&callable, site.args)),
            _ => Resolution::NotFound,
        }
    }

    fn priority(&self) -> u8 {
        2
    }

    fn name(&self) -> &'static str {
        "scope"
    }
}
