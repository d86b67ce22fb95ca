//! Strand runtime
//!
//! Runtime pieces shared by the engine and every compiler backend:
//! - [`Value`] and the [`Callable`] / [`HostObject`] traits
//! - [`EvaluationContext`] and the scope resolver ([`scope`])
//! - [`SessionNamespace`] of shared functions
//! - The three-tier [`DispatchChain`]
//! - Interpreter-mode promotion ([`promote`])
//! - Output sinks for the synthetic `out` name
//! - The [`CompilerBackend`] / [`CompiledUnit`] contract

mod backend;
pub mod builtins;
mod context;
pub mod dispatch;
pub mod errors;
mod namespace;
mod output;
mod promoter;
pub mod scope;
mod session;
mod shared;
mod stack;
mod value;

pub use backend::{CompileError, CompiledUnit, CompilerBackend};
pub use context::{CollectedLocals, ContextRef, EvaluationContext, SessionBindings};
pub use dispatch::{CallResolver, CallResolverKind, CallSite, DispatchChain, Resolution};
pub use errors::{EvalBacktrace, EvalError, EvalErrorKind, EvalResult};
pub use namespace::SessionNamespace;
pub use output::OutputSink;
pub use promoter::{promote, Promotion};
pub use scope::AssignTarget;
pub use session::{
    CallGuard, InterruptHandle, Invocation, NativeRegistry, Session, DEFAULT_MAX_CALL_DEPTH,
};
pub use shared::SharedMutable;
pub use stack::ensure_sufficient_stack;
pub use value::{int_to_float, Callable, HostObject, NativeFunction, Value};
