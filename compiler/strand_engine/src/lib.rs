//! Strand engine
//!
//! Executes scripts and structural traversal programs against a session:
//! - [`CompiledUnitCache`]: source text to compiled unit, per-entry retention
//! - [`Translator`]: structural programs to Strand or Python source text
//! - [`ScriptEngine`]: the facade tying cache, session and translator together
//! - [`EngineConfig`] and the [`DependencyFetcher`] boundary for plugins

pub mod cache;
mod config;
mod engine;
mod errors;
mod fetcher;
pub mod translator;

pub use cache::{CacheStats, CompiledUnitCache, RetentionPolicy};
pub use config::{ConfigError, EngineConfig};
pub use engine::{EvalOptions, ScriptEngine};
pub use errors::EngineError;
pub use fetcher::{Artifact, DependencyFetcher, FetchError, PluginDescriptor, StaticFetcher};
pub use translator::{root_variable, Dialect, TranslationError, Translator};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only ever installs once.
///
/// # Example
///
/// ```bash
/// RUST_LOG=strand_engine=debug strand run script.strand
/// RUST_LOG=strand_engine::cache=trace strand repl
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
