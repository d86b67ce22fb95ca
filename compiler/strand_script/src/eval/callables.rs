//! Callable values produced by scripts, and the script instance that acts as
//! the receiver of unqualified calls.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use strand_runtime::builtins::output_method;
use strand_runtime::errors::wrong_arg_count;
use strand_runtime::{Callable, EvalResult, HostObject, Invocation, Value};

use super::environment::{Captured, Environment};
use super::Interpreter;
use crate::ast::ClosureId;
use crate::unit::ScriptProgram;

/// Name the implicit closure parameter is bound to.
const IT: &str = "it";

/// A top-level `def` of a compiled script.
pub(crate) struct FunctionValue {
    program: Arc<ScriptProgram>,
    index: usize,
}

impl FunctionValue {
    pub(crate) fn new(program: Arc<ScriptProgram>, index: usize) -> Self {
        FunctionValue { program, index }
    }
}

impl Callable for FunctionValue {
    fn name(&self) -> &str {
        &self.program.script.functions[self.index].name
    }

    fn call(&self, args: &[Value], inv: &Invocation) -> EvalResult {
        let def = &self.program.script.functions[self.index];
        if args.len() != def.params.len() {
            return Err(wrong_arg_count(&def.name, def.params.len(), args.len()));
        }
        let params: FxHashMap<String, Value> = def
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        Interpreter::new(&self.program, inv, Environment::with_root(params), false)
            .run(&def.body)
            .map_err(|e| e.in_frame(&def.name))
    }

    fn arity(&self) -> Option<usize> {
        Some(self.program.script.functions[self.index].params.len())
    }
}

/// A closure literal together with the bindings it captured.
pub(crate) struct ClosureValue {
    program: Arc<ScriptProgram>,
    id: ClosureId,
    captured: Arc<Captured>,
}

impl ClosureValue {
    pub(crate) fn new(program: Arc<ScriptProgram>, id: ClosureId, captured: Captured) -> Self {
        ClosureValue {
            program,
            id,
            captured: Arc::new(captured),
        }
    }
}

impl Callable for ClosureValue {
    fn name(&self) -> &str {
        "closure"
    }

    fn call(&self, args: &[Value], inv: &Invocation) -> EvalResult {
        let def = self.program.script.arena.closure(self.id);
        let mut env = Environment::with_root(FxHashMap::clone(&self.captured));
        env.push_scope();
        match &def.params {
            None => {
                if args.len() > 1 {
                    return Err(wrong_arg_count(self.name(), 1, args.len()));
                }
                env.define(IT, args.first().cloned().unwrap_or(Value::Null));
            }
            Some(params) => {
                if args.len() != params.len() {
                    return Err(wrong_arg_count(self.name(), params.len(), args.len()));
                }
                for (param, arg) in params.iter().zip(args) {
                    env.define(param.as_str(), arg.clone());
                }
            }
        }
        Interpreter::new(&self.program, inv, env, false)
            .run(&def.body)
            .map_err(|e| e.in_frame(self.name()))
    }

    fn arity(&self) -> Option<usize> {
        let def = self.program.script.arena.closure(self.id);
        Some(def.params.as_ref().map_or(1, Vec::len))
    }
}

/// The running script as a receiver: its own functions plus `print` and
/// `println` on the call's output sink.
pub(crate) struct ScriptInstance {
    program: Arc<ScriptProgram>,
}

impl ScriptInstance {
    pub(crate) fn new(program: Arc<ScriptProgram>) -> Self {
        ScriptInstance { program }
    }
}

impl HostObject for ScriptInstance {
    fn type_name(&self) -> &str {
        &self.program.name
    }

    fn invoke(&self, method: &str, args: &[Value], inv: &Invocation) -> Option<EvalResult> {
        if let Some((index, _)) = self.program.script.function(method) {
            let function: Arc<dyn Callable> =
                Arc::new(FunctionValue::new(Arc::clone(&self.program), index));
            return Some(inv.call(&function, args));
        }
        match method {
            "print" | "println" => output_method(inv.context().output(), method, args),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        self.program.name.clone()
    }
}
