//! The Strand backend and its compiled units.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strand_ir::{LineCol, LineIndex, Span, SymbolTable};
use strand_runtime::{
    Callable, CompileError, CompiledUnit, CompilerBackend, EvalResult, Invocation,
};

use crate::ast::Script;
use crate::eval::{Environment, FunctionValue, Interpreter};
use crate::parse;

/// Dialect name of this backend.
pub const LANGUAGE: &str = "strand";

/// Everything a unit needs at run time, shared by the unit, its functions
/// and its closures.
pub(crate) struct ScriptProgram {
    /// Generated class-like name, such as `Script3`.
    pub(crate) name: String,
    pub(crate) script: Script,
    pub(crate) lines: LineIndex,
    pub(crate) symbols: Arc<SymbolTable>,
}

impl ScriptProgram {
    pub(crate) fn location(&self, span: Span) -> LineCol {
        self.lines.line_col(span.start)
    }
}

/// A compiled Strand script.
pub struct StrandUnit {
    program: Arc<ScriptProgram>,
}

impl StrandUnit {
    pub fn name(&self) -> &str {
        &self.program.name
    }

    /// Names of the script's top-level functions, in declaration order.
    pub fn function_names(&self) -> Vec<&str> {
        self.program
            .script
            .functions
            .iter()
            .map(|def| def.name.as_str())
            .collect()
    }
}

impl CompiledUnit for StrandUnit {
    fn run(&self, inv: &Invocation) -> EvalResult {
        tracing::trace!(unit = %self.program.name, "running script");
        Interpreter::new(&self.program, inv, Environment::new(), true)
            .run(&self.program.script.body)
    }

    fn members(&self) -> Vec<(String, Arc<dyn Callable>)> {
        (0..self.program.script.functions.len())
            .map(|index| {
                let function = FunctionValue::new(Arc::clone(&self.program), index);
                let callable: Arc<dyn Callable> = Arc::new(function);
                (callable.name().to_string(), callable)
            })
            .collect()
    }
}

impl fmt::Debug for StrandUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrandUnit")
            .field("name", &self.program.name)
            .field("functions", &self.function_names())
            .finish()
    }
}

/// Compiles Strand source into [`StrandUnit`]s.
#[derive(Debug, Default)]
pub struct StrandBackend {
    compiled: AtomicU64,
}

impl StrandBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompilerBackend for StrandBackend {
    fn language(&self) -> &str {
        LANGUAGE
    }

    fn compile(
        &self,
        source: &str,
        symbols: &Arc<SymbolTable>,
    ) -> Result<Arc<dyn CompiledUnit>, CompileError> {
        let lines = LineIndex::new(source);
        let script = parse(source).map_err(|e| e.into_compile_error(&lines))?;
        let id = self.compiled.fetch_add(1, Ordering::Relaxed) + 1;
        let name = format!("Script{id}");
        tracing::debug!(
            unit = %name,
            functions = script.functions.len(),
            statements = script.body.len(),
            "compiled script"
        );
        Ok(Arc::new(StrandUnit {
            program: Arc::new(ScriptProgram {
                name,
                script,
                lines,
                symbols: Arc::clone(symbols),
            }),
        }))
    }
}
