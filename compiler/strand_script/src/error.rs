//! Syntax errors raised before evaluation.

use strand_ir::{LineIndex, Span};
use strand_runtime::CompileError;

/// A lexing or parsing failure at a byte span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        SyntaxError {
            message: message.into(),
            span,
        }
    }

    /// Attach a 1-based line and column.
    pub fn into_compile_error(self, index: &LineIndex) -> CompileError {
        CompileError::new(self.message, index.line_col(self.span.start), self.span)
    }
}
