//! Runtime error types.
//!
//! `EvalErrorKind` carries the structured category; factory functions
//! (`undefined_variable()`, `unresolved_call()`, ...) are the public way to
//! build errors and keep `kind` and `message` in sync.

use std::fmt;

use strand_ir::LineCol;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Arithmetic
    DivisionByZero,
    IntegerOverflow {
        operation: String,
    },

    // Type/Operator
    TypeMismatch {
        expected: String,
        got: String,
    },
    InvalidBinaryOp {
        op: String,
        left: String,
        right: String,
    },

    // Access
    UndefinedVariable {
        name: String,
    },
    IndexOutOfBounds {
        index: i64,
    },
    KeyNotFound {
        key: String,
    },

    // Calls
    /// Every dispatch tier failed to resolve the call.
    UnresolvedCall {
        name: String,
        receiver: Option<String>,
    },
    NotCallable {
        type_name: String,
    },
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    RecursionLimit {
        depth: usize,
    },

    // Environment
    Interrupted,
    /// An embedder-supplied host object or output sink failed.
    HostFailure {
        message: String,
    },

    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::IntegerOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }

            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::InvalidBinaryOp { op, left, right } => {
                write!(f, "operator `{op}` cannot be applied to {left} and {right}")
            }

            Self::UndefinedVariable { name } => write!(f, "undefined variable: {name}"),
            Self::IndexOutOfBounds { index } => write!(f, "index {index} out of bounds"),
            Self::KeyNotFound { key } => write!(f, "key not found: {key}"),

            Self::UnresolvedCall { name, receiver } => match receiver {
                Some(receiver) => write!(f, "no method '{name}' on {receiver}"),
                None => write!(f, "no function '{name}'"),
            },
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                write!(f, "{name} expects {expected} {arg_word}, got {got}")
            }
            Self::RecursionLimit { depth } => {
                write!(f, "maximum call depth exceeded (limit: {depth})")
            }

            Self::Interrupted => write!(f, "evaluation interrupted"),
            Self::HostFailure { message } => write!(f, "host failure: {message}"),

            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Call names leading to an error, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<String>,
}

impl EvalBacktrace {
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            writeln!(f, "  {i}: {frame}")?;
        }
        Ok(())
    }
}

/// Runtime error raised while running a compiled unit.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    /// Source position of the failing expression, when the backend knows it.
    pub location: Option<LineCol>,
    pub backtrace: EvalBacktrace,
}

impl EvalError {
    /// Create an error with just a message (`Custom` kind).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError {
            kind,
            message,
            location: None,
            backtrace: EvalBacktrace::default(),
        }
    }

    /// Attach a location unless one is already set; the innermost wins.
    #[must_use]
    pub fn at(mut self, location: LineCol) -> Self {
        self.location.get_or_insert(location);
        self
    }

    /// Record a call frame while the error unwinds through it.
    #[must_use]
    pub fn in_frame(mut self, name: &str) -> Self {
        self.backtrace.frames.insert(0, name.to_string());
        self
    }

    pub fn is_unresolved_call(&self) -> bool {
        matches!(self.kind, EvalErrorKind::UnresolvedCall { .. })
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{} (at {location})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EvalError {}

// Arithmetic

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

// Type/Operator

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn invalid_binary_op(op: &str, left: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidBinaryOp {
        op: op.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    })
}

// Access

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index })
}

#[cold]
pub fn key_not_found(key: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::KeyNotFound {
        key: key.to_string(),
    })
}

// Calls

#[cold]
pub fn unresolved_call(name: &str, receiver: Option<&str>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnresolvedCall {
        name: name.to_string(),
        receiver: receiver.map(str::to_string),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn wrong_arg_count(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn wrong_arg_type(method: &str, expected: &str) -> EvalError {
    EvalError::new(format!("{method} expects a {expected} argument"))
}

#[cold]
pub fn recursion_limit_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::RecursionLimit { depth })
}

// Environment

#[cold]
pub fn interrupted() -> EvalError {
    EvalError::from_kind(EvalErrorKind::Interrupted)
}

#[cold]
pub fn host_failure(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::HostFailure {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests;
