//! The engine facade.
//!
//! One [`ScriptEngine`] owns a compiled-unit cache, a session (namespace,
//! session bindings, native handlers) and the current import universe. Each
//! evaluation:
//!
//! 1. Fetches or compiles the unit for the source text
//! 2. Builds a fresh `EvaluationContext` over the session bindings
//! 3. Runs the unit on the caller's thread
//! 4. On success commits staged session writes, promotes interpreter-mode
//!    locals and registers the unit's functions in the namespace
//! 5. On failure discards everything the call staged
//!
//! Engines are `Send + Sync` and meant to be shared behind an `Arc`.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use strand_ir::{core_imports, StructuralProgram, SymbolTable};
use strand_runtime::{
    promote, CompiledUnit, CompilerBackend, EvalResult, EvaluationContext, HostObject,
    InterruptHandle, Invocation, OutputSink, SessionNamespace, Session, Value,
};
use strand_script::StrandBackend;

use crate::cache::{CompiledUnitCache, RetentionPolicy};
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::fetcher::{Artifact, DependencyFetcher, FetchError, PluginDescriptor};
use crate::translator::{root_variable, Dialect, Translator};

/// Per-call options.
#[derive(Clone, Debug, Default)]
pub struct EvalOptions {
    /// Call-local bindings visible to the script.
    pub bindings: Vec<(String, Value)>,
    /// Overrides the engine's default retention.
    pub retention: Option<RetentionPolicy>,
    /// Overrides the engine's output sink.
    pub output: Option<OutputSink>,
    pub interrupt: Option<InterruptHandle>,
}

impl EvalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_binding(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = Some(interrupt);
        self
    }
}

/// Script execution engine.
pub struct ScriptEngine {
    config: EngineConfig,
    cache: CompiledUnitCache,
    session: Arc<Session>,
    /// Serializes `add_imports`, `use_artifact` and `reset`.
    reconfigure: Mutex<()>,
    /// Imports added at runtime through [`ScriptEngine::add_imports`].
    added_imports: RwLock<SymbolTable>,
    /// Handlers registered through [`ScriptEngine::register_native`].
    natives: RwLock<Vec<(String, Arc<dyn HostObject>)>>,
    artifacts: RwLock<Vec<Artifact>>,
    plugins: RwLock<Vec<PluginDescriptor>>,
    fetcher: Option<Arc<dyn DependencyFetcher>>,
    output: OutputSink,
}

impl ScriptEngine {
    /// Engine with the default configuration and the Strand backend.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self::assemble(config, Arc::new(StrandBackend::new()))
    }

    /// Engine with the Strand backend. Runs the configured init scripts.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_backend(config, Arc::new(StrandBackend::new()))
    }

    /// Engine over any backend. Runs the configured init scripts.
    pub fn with_backend(
        config: EngineConfig,
        backend: Arc<dyn CompilerBackend>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let engine = Self::assemble(config, backend);
        engine.run_init_scripts()?;
        Ok(engine)
    }

    fn assemble(config: EngineConfig, backend: Arc<dyn CompilerBackend>) -> Self {
        let session = Session::new().with_max_call_depth(config.max_call_depth);
        let mut symbols = core_imports();
        symbols.merge(&config.imports);
        let cache = CompiledUnitCache::with_soft_capacity(backend, config.soft_capacity)
            .with_symbols(Arc::new(symbols));
        ScriptEngine {
            config,
            cache,
            session: Arc::new(session),
            reconfigure: Mutex::new(()),
            added_imports: RwLock::new(SymbolTable::new()),
            natives: RwLock::new(Vec::new()),
            artifacts: RwLock::new(Vec::new()),
            plugins: RwLock::new(Vec::new()),
            fetcher: None,
            output: OutputSink::stdout(),
        }
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn DependencyFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Default output sink for calls that do not supply one.
    #[must_use]
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &CompiledUnitCache {
        &self.cache
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn namespace(&self) -> &SessionNamespace {
        self.session.namespace()
    }

    /// Current import universe.
    pub fn symbols(&self) -> Arc<SymbolTable> {
        self.cache.symbols()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.artifacts.read().clone()
    }

    /// Evaluate source text.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn eval(&self, source: &str, options: EvalOptions) -> Result<Value, EngineError> {
        let retention = options.retention.unwrap_or(self.config.default_retention);
        let unit = self.cache.get_or_compile(source, retention)?;
        self.run_unit(&unit, options)
    }

    /// Translate a structural program for the Strand backend, rooted at its
    /// traversal source, and evaluate the result.
    #[tracing::instrument(level = "debug", skip_all, fields(steps = program.instructions.len()))]
    pub fn eval_program(
        &self,
        program: &StructuralProgram,
        options: EvalOptions,
    ) -> Result<Value, EngineError> {
        let source = self.translate(program)?;
        tracing::debug!(%source, "translated program");
        self.eval(&source, options)
    }

    /// Render a program in the Strand dialect, rooted at its traversal source.
    pub fn translate(&self, program: &StructuralProgram) -> Result<String, EngineError> {
        self.translate_with(program, Dialect::Strand, root_variable(program))
    }

    pub fn translate_with(
        &self,
        program: &StructuralProgram,
        dialect: Dialect,
        root: &str,
    ) -> Result<String, EngineError> {
        let symbols = self.symbols();
        Ok(Translator::new(dialect, &symbols).translate(program, root)?)
    }

    /// Call a session function (or callable session binding) by name.
    pub fn invoke_function(
        &self,
        name: &str,
        args: &[Value],
        options: EvalOptions,
    ) -> Result<Value, EngineError> {
        let (ctx, inv) = self.prepare(options, false);
        let result = inv.invoke(None, name, args);
        Self::finish(&ctx, self.session.namespace(), result)
    }

    /// Call `name` on `receiver` through the dispatch chain.
    pub fn invoke_method(
        &self,
        receiver: &Value,
        name: &str,
        args: &[Value],
        options: EvalOptions,
    ) -> Result<Value, EngineError> {
        let (ctx, inv) = self.prepare(options, false);
        let result = inv.invoke(Some(receiver), name, args);
        Self::finish(&ctx, self.session.namespace(), result)
    }

    /// Register a native handler for an imported type. Survives resets.
    pub fn register_native(&self, type_name: impl Into<String>, handler: Arc<dyn HostObject>) {
        let type_name = type_name.into();
        self.session
            .natives()
            .register_type(type_name.clone(), Arc::clone(&handler));
        self.natives.write().push((type_name, handler));
    }

    /// Extend the import universe. Invalidates the cache, clears the
    /// namespace and re-runs init scripts; session bindings are kept.
    pub fn add_imports(&self, imports: &SymbolTable) -> Result<(), EngineError> {
        let _reconfiguring = self.reconfigure.lock();
        self.added_imports.write().merge(imports);
        self.reload()
    }

    /// Fetch an artifact and apply its plugins. Nothing changes if the fetch
    /// fails.
    pub fn use_artifact(&self, artifact: Artifact) -> Result<(), EngineError> {
        let plugins = self.fetch(&artifact)?;
        tracing::debug!(%artifact, plugins = plugins.len(), "artifact resolved");
        let _reconfiguring = self.reconfigure.lock();
        self.artifacts.write().push(artifact);
        self.plugins.write().extend(plugins);
        self.reload()
    }

    /// Full reset: clears session bindings, re-fetches every recorded
    /// artifact and rebuilds everything derived from configuration.
    pub fn reset(&self) -> Result<(), EngineError> {
        let _reconfiguring = self.reconfigure.lock();
        self.session.bindings().clear();
        let mut plugins = Vec::new();
        for artifact in self.artifacts.read().iter() {
            plugins.extend(self.fetch(artifact)?);
        }
        *self.plugins.write() = plugins;
        self.reload()
    }

    fn fetch(&self, artifact: &Artifact) -> Result<Vec<PluginDescriptor>, EngineError> {
        let fetcher = self.fetcher.as_ref().ok_or(FetchError::NoFetcher)?;
        Ok(fetcher.fetch(artifact)?)
    }

    /// Internal reset: new symbol generation, empty cache and namespace,
    /// natives re-registered, init scripts re-run. Caller holds
    /// `reconfigure`.
    fn reload(&self) -> Result<(), EngineError> {
        let mut symbols = core_imports();
        symbols.merge(&self.config.imports);
        symbols.merge(&self.added_imports.read());

        let natives = self.session.natives();
        natives.clear();
        for plugin in self.plugins.read().iter() {
            symbols.merge(&plugin.imports);
            for (type_name, handler) in &plugin.natives {
                natives.register_type(type_name.clone(), Arc::clone(handler));
            }
        }
        for (type_name, handler) in self.natives.read().iter() {
            natives.register_type(type_name.clone(), Arc::clone(handler));
        }

        self.cache.replace_symbols(Arc::new(symbols));
        self.session.namespace().clear();
        tracing::debug!(generation = self.cache.generation(), "engine reloaded");
        self.run_init_scripts()
    }

    /// Plugin init scripts first, then configured ones. A failing script is
    /// logged and skipped; an unreadable script file is an error.
    fn run_init_scripts(&self) -> Result<(), EngineError> {
        let mut scripts: Vec<String> = self
            .plugins
            .read()
            .iter()
            .flat_map(|plugin| plugin.init_scripts.iter().cloned())
            .collect();
        scripts.extend(self.config.load_init_scripts()?);

        for (index, script) in scripts.iter().enumerate() {
            if let Err(err) = self.eval(script, EvalOptions::new()) {
                tracing::warn!(index, error = %err, "init script failed");
            }
        }
        Ok(())
    }

    fn run_unit(
        &self,
        unit: &Arc<dyn CompiledUnit>,
        options: EvalOptions,
    ) -> Result<Value, EngineError> {
        let namespace = self.session.namespace();
        let (ctx, inv) = self.prepare(options, self.config.interpreter_mode);
        let value = Self::finish(&ctx, namespace, unit.run(&inv))?;
        for (name, callable) in unit.members() {
            namespace.register(name, callable);
        }
        Ok(value)
    }

    fn prepare(&self, options: EvalOptions, collect: bool) -> (EvaluationContext, Invocation) {
        let output = options.output.unwrap_or_else(|| self.output.clone());
        let ctx = EvaluationContext::new(self.session.bindings().clone(), output);
        for (name, value) in options.bindings {
            ctx.set_local(name, value);
        }
        if collect {
            ctx.begin_collection();
        }
        let mut inv = Invocation::new(ctx.clone(), Arc::clone(&self.session));
        if let Some(interrupt) = options.interrupt {
            inv = inv.with_interrupt(interrupt);
        }
        (ctx, inv)
    }

    fn finish(
        ctx: &EvaluationContext,
        namespace: &SessionNamespace,
        result: EvalResult,
    ) -> Result<Value, EngineError> {
        match result {
            Ok(value) => {
                ctx.commit();
                promote(ctx, namespace);
                Ok(value)
            }
            Err(err) => {
                ctx.discard_staged();
                ctx.take_collected();
                tracing::debug!(error = %err, "evaluation failed");
                Err(err.into())
            }
        }
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngine")
            .field("language", &self.cache.backend().language())
            .field("interpreter_mode", &self.config.interpreter_mode)
            .field("cache", &self.cache.stats())
            .field("namespace", &self.session.namespace().names())
            .field("artifacts", &self.artifacts.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
