//! Engine-level errors.
//!
//! Everything [`crate::ScriptEngine`] can fail with. Runtime failures keep
//! the structured [`EvalError`]; an exhausted dispatch chain is lifted into
//! its own variant so callers can tell a missing function apart from a
//! failing one.

use strand_ir::LineCol;
use strand_runtime::{CompileError, EvalError, EvalErrorKind};

use crate::config::ConfigError;
use crate::fetcher::FetchError;
use crate::translator::TranslationError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed source. Never cached.
    #[error("compilation failed: {0}")]
    Compilation(#[from] CompileError),

    /// No dispatch tier could resolve a call.
    #[error("{}", unresolved_message(.name, .receiver, .location))]
    UnresolvedCall {
        name: String,
        receiver: Option<String>,
        location: Option<LineCol>,
    },

    #[error("runtime error: {0}")]
    Runtime(EvalError),

    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Source position of the failure, when known.
    pub fn location(&self) -> Option<LineCol> {
        match self {
            EngineError::Compilation(err) => Some(err.location),
            EngineError::UnresolvedCall { location, .. } => *location,
            EngineError::Runtime(err) => err.location,
            _ => None,
        }
    }
}

impl From<EvalError> for EngineError {
    fn from(err: EvalError) -> Self {
        match err.kind {
            EvalErrorKind::UnresolvedCall { name, receiver } => EngineError::UnresolvedCall {
                name,
                receiver,
                location: err.location,
            },
            kind => EngineError::Runtime(EvalError { kind, ..err }),
        }
    }
}

fn unresolved_message(
    name: &str,
    receiver: &Option<String>,
    location: &Option<LineCol>,
) -> String {
    let mut message = match receiver {
        Some(receiver) => format!("unresolved call: no method '{name}' on {receiver}"),
        None => format!("unresolved call: no function '{name}'"),
    };
    if let Some(location) = location {
        message.push_str(&format!(" (at {location})"));
    }
    message
}
