//! Compiler backend contract.
//!
//! A backend turns source text into a [`CompiledUnit`]. Units are immutable
//! once built and shared by every concurrent evaluation of the same text.

use std::fmt;
use std::sync::Arc;

use strand_ir::{LineCol, Span, SymbolTable};

use crate::errors::EvalResult;
use crate::session::Invocation;
use crate::value::Callable;

/// Malformed source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub location: LineCol,
    pub span: Span,
}

impl CompileError {
    pub fn new(message: impl Into<String>, location: LineCol, span: Span) -> Self {
        CompileError {
            message: message.into(),
            location,
            span,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// An executable artifact produced from one source text.
pub trait CompiledUnit: Send + Sync {
    /// Execute the unit's top-level code.
    fn run(&self, inv: &Invocation) -> EvalResult;

    /// Public, ownerless functions the unit defines, for registration in the
    /// session namespace.
    fn members(&self) -> Vec<(String, Arc<dyn Callable>)>;
}

impl fmt::Debug for dyn CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<compiled unit>")
    }
}

/// Compiles source text in one dialect.
pub trait CompilerBackend: Send + Sync {
    /// Dialect name, such as `strand`.
    fn language(&self) -> &str;

    /// Compile `source` against the given import universe.
    fn compile(
        &self,
        source: &str,
        symbols: &Arc<SymbolTable>,
    ) -> Result<Arc<dyn CompiledUnit>, CompileError>;
}
