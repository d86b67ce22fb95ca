//! Direct tier: methods of the receiver itself.

use super::{CallResolver, CallSite, Resolution};
use crate::builtins;
use crate::session::Invocation;
use crate::value::Value;

/// Resolves methods on the receiver. Never handles receiver-less calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectResolver;

impl CallResolver for DirectResolver {
    fn resolve(&self, site: &CallSite<'_>, inv: &Invocation) -> Resolution {
        let Some(receiver) = site.receiver else {
            return Resolution::NotFound;
        };
        let (name, args) = (site.name, site.args);
        let result = match receiver {
            Value::Host(host) => host.invoke(name, args, inv),
            Value::Type(type_name) => inv
                .session()
                .natives()
                .handler(type_name)
                .and_then(|handler| handler.invoke(name, args, inv)),
            Value::Callable(callable) if name == "call" => Some(inv.call(callable, args)),
            Value::Output(sink) => builtins::output_method(sink, name, args),
            Value::Context(handle) => builtins::context_method(handle, name, args),
            other => builtins::value_method(other, name, args, inv),
        };
        result.into()
    }

    fn priority(&self) -> u8 {
        0
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
