//! Tree-walking evaluator.
//!
//! # Name Resolution
//!
//! 1. Script locals (`var`, parameters, closure captures)
//! 2. The scope resolver (call-local, session, `out`, `context`)
//! 3. Imported types and bare enum constants
//! 4. `UndefinedVariable`
//!
//! Unqualified calls use a callable script local when one exists; otherwise
//! they go through the dispatch chain with the script instance as receiver.

mod callables;
mod environment;
mod ops;

use std::collections::BTreeMap;
use std::sync::Arc;

use strand_ir::QualifiedName;
use strand_runtime::errors::{not_callable, type_mismatch, undefined_variable};
use strand_runtime::{
    ensure_sufficient_stack, AssignTarget, EvalError, EvalResult, Invocation, Value,
};

use crate::ast::{self, Block, BinaryOp, ExprId, ExprKind, Stmt};
use crate::unit::ScriptProgram;

pub(crate) use callables::FunctionValue;
use callables::{ClosureValue, ScriptInstance};
pub(crate) use environment::Environment;

/// How a statement finished.
enum Flow {
    Normal(Value),
    Return(Value),
}

impl Flow {
    fn into_value(self) -> Value {
        match self {
            Flow::Normal(value) | Flow::Return(value) => value,
        }
    }
}

/// Evaluates one body (the script, a function or a closure) of a program.
pub(crate) struct Interpreter<'a> {
    program: &'a Arc<ScriptProgram>,
    inv: &'a Invocation,
    env: Environment,
    /// Running the script body itself, not a function or closure.
    top_level: bool,
    /// Receiver of unqualified calls.
    receiver: Value,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        program: &'a Arc<ScriptProgram>,
        inv: &'a Invocation,
        env: Environment,
        top_level: bool,
    ) -> Self {
        Interpreter {
            program,
            inv,
            env,
            top_level,
            receiver: Value::host(ScriptInstance::new(Arc::clone(program))),
        }
    }

    /// Run a body in the current scope. The result is the value of a
    /// `return`, or of the last statement.
    pub(crate) fn run(mut self, body: &'a Block) -> EvalResult {
        Ok(self.exec_stmts(body)?.into_value())
    }

    fn program(&self) -> &'a ScriptProgram {
        self.program
    }

    // ===== Statements =====

    fn exec_stmts(&mut self, body: &'a [Stmt]) -> Result<Flow, EvalError> {
        let mut last = Value::Null;
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal(value) => last = value,
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec_block(&mut self, block: &'a Block) -> Result<Flow, EvalError> {
        self.env.push_scope();
        let flow = self.exec_stmts(block);
        self.env.pop_scope();
        flow
    }

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expr(id) => Ok(Flow::Normal(self.eval(*id)?)),
            Stmt::Var { name, init } => {
                let value = self.eval(*init)?;
                self.env.define(name.as_str(), value.clone());
                if self.top_level && self.env.depth() == 1 {
                    self.inv.context().collect_local(name, value.clone());
                }
                Ok(Flow::Normal(value))
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(id) => self.eval(*id)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                if self.eval(*cond)?.is_truthy() {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }
            Stmt::While { cond, body } => {
                loop {
                    self.inv.check_interrupt()?;
                    if !self.eval(*cond)?.is_truthy() {
                        break;
                    }
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::For {
                var,
                iterable,
                body,
            } => {
                let items = iteration_items(&self.eval(*iterable)?)?;
                for item in items {
                    self.inv.check_interrupt()?;
                    self.env.push_scope();
                    self.env.define(var.as_str(), item);
                    let flow = self.exec_stmts(body);
                    self.env.pop_scope();
                    if let Flow::Return(value) = flow? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }
        }
    }

    // ===== Expressions =====

    fn eval(&mut self, id: ExprId) -> EvalResult {
        let expr = self.program().script.arena.get(id);
        ensure_sufficient_stack(|| self.eval_kind(&expr.kind))
            .map_err(|e| e.at(self.program().location(expr.span)))
    }

    fn eval_kind(&mut self, kind: &'a ExprKind) -> EvalResult {
        match kind {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::Str(s) => Ok(Value::Str(Arc::clone(s))),
            ExprKind::Ident(name) => self.lookup(name),
            ExprKind::List(items) => Ok(Value::list(self.eval_all(items)?)),
            ExprKind::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    let key = ops::map_key(&self.eval(*key)?);
                    map.insert(key, self.eval(*value)?);
                }
                Ok(Value::map(map))
            }
            ExprKind::Unary { op, operand } => ops::unary(*op, &self.eval(*operand)?),
            ExprKind::Binary { op, left, right } => self.binary(*op, *left, *right),
            ExprKind::Property { receiver, name } => {
                let receiver = self.eval(*receiver)?;
                self.property(&receiver, name)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(*receiver)?;
                let args = self.eval_all(args)?;
                if receiver.is_null() {
                    return Err(EvalError::new(format!(
                        "cannot invoke method {method}() on null object"
                    )));
                }
                self.inv.invoke(Some(&receiver), method, &args)
            }
            ExprKind::Call { name, args } => {
                let args = self.eval_all(args)?;
                self.call_unqualified(name, &args)
            }
            ExprKind::CallValue { callee, args } => {
                let callee = self.eval(*callee)?;
                let args = self.eval_all(args)?;
                self.inv.call_value(&callee, &args)
            }
            ExprKind::Index { receiver, index } => {
                let receiver = self.eval(*receiver)?;
                let index = self.eval(*index)?;
                ops::index(&receiver, &index)
            }
            ExprKind::Closure(id) => Ok(Value::callable(ClosureValue::new(
                Arc::clone(self.program),
                *id,
                self.env.capture(),
            ))),
            ExprKind::Assign { target, value } => {
                let value = self.eval(*value)?;
                match target {
                    ast::AssignTarget::Name(name) => self.assign(name, value.clone()),
                    ast::AssignTarget::Index { name, index } => {
                        let index = self.eval(*index)?;
                        let current = self.lookup(name)?;
                        let updated = ops::set_index(current, &index, value.clone())?;
                        self.assign(name, updated);
                    }
                }
                Ok(value)
            }
        }
    }

    fn eval_all(&mut self, ids: &'a [ExprId]) -> Result<Vec<Value>, EvalError> {
        ids.iter().map(|id| self.eval(*id)).collect()
    }

    fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> EvalResult {
        let left = self.eval(left)?;
        match op {
            BinaryOp::And if !left.is_truthy() => Ok(Value::Bool(false)),
            BinaryOp::Or if left.is_truthy() => Ok(Value::Bool(true)),
            BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(self.eval(right)?.is_truthy())),
            _ => {
                let right = self.eval(right)?;
                ops::binary(op, &left, &right)
            }
        }
    }

    // ===== Names =====

    fn lookup(&self, name: &str) -> EvalResult {
        if let Some(value) = self.env.lookup(name) {
            return Ok(value);
        }
        if let Some(value) = self.inv.resolve(name) {
            return Ok(value);
        }
        let symbols = &self.program().symbols;
        if symbols.has_type(name) {
            return Ok(Value::Type(name.into()));
        }
        if let Some(owner) = symbols.enum_owner_of(name) {
            return Ok(Value::Enum(QualifiedName::new(owner, name)));
        }
        Err(undefined_variable(name))
    }

    /// Script locals are updated in place; anything else goes through the
    /// scope resolver. Writes that outlive nothing but this call are recorded
    /// for interpreter-mode promotion.
    fn assign(&mut self, name: &str, value: Value) {
        match self.env.assign(name, value.clone()) {
            Some(0) if self.top_level => self.inv.context().collect_local(name, value),
            Some(_) => {}
            None => {
                if self.inv.assign(name, value.clone()) == AssignTarget::Local {
                    self.inv.context().collect_local(name, value);
                }
            }
        }
    }

    fn call_unqualified(&self, name: &str, args: &[Value]) -> EvalResult {
        match self.env.lookup(name) {
            Some(Value::Callable(callable)) => self.inv.call(&callable, args),
            Some(other) => Err(not_callable(other.type_name())),
            None => self.inv.invoke(Some(&self.receiver), name, args),
        }
    }

    fn property(&self, receiver: &Value, name: &str) -> EvalResult {
        let found = match receiver {
            Value::Map(entries) => Some(entries.get(name).cloned().unwrap_or(Value::Null)),
            Value::Type(owner) => {
                let constant = QualifiedName::new(&**owner, name);
                if self.program().symbols.has_enum_constant(&constant) {
                    Some(Value::Enum(constant))
                } else {
                    self.inv
                        .session()
                        .natives()
                        .handler(owner)
                        .and_then(|handler| handler.property(name))
                }
            }
            Value::Host(object) => object.property(name),
            Value::Null => {
                return Err(EvalError::new(format!(
                    "cannot get property '{name}' on null object"
                )))
            }
            _ => None,
        };
        found.ok_or_else(|| {
            EvalError::new(format!(
                "no property '{name}' on {}",
                receiver.type_name()
            ))
        })
    }
}

/// Items a `for` loop walks: list items, map entries as `[key:, value:]`
/// maps, or the characters of a string.
fn iteration_items(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items.to_vec()),
        Value::Map(entries) => Ok(entries
            .iter()
            .map(|(key, value)| {
                let mut entry = BTreeMap::new();
                entry.insert("key".to_string(), Value::from(key.as_str()));
                entry.insert("value".to_string(), value.clone());
                Value::map(entry)
            })
            .collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(type_mismatch("list, map or string", other.type_name())),
    }
}

#[cfg(test)]
mod tests;
