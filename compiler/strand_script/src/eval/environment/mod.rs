//! Script-local variables.
//!
//! Uses a scope stack (not cloning) for scope management. Closures take a
//! flattened snapshot of every visible binding when they are created.

use rustc_hash::FxHashMap;
use strand_runtime::Value;

/// Captured bindings of a closure, innermost definition winning.
pub type Captured = FxHashMap<String, Value>;

/// Environment for the interpreter using a scope stack.
#[derive(Clone, Debug)]
pub struct Environment {
    /// Stack of scopes, with the current scope at the top. Never empty.
    scopes: Vec<FxHashMap<String, Value>>,
}

impl Environment {
    /// Create an environment with one empty root scope.
    pub fn new() -> Self {
        Environment {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Create an environment whose root scope holds `bindings`.
    pub fn with_root(bindings: FxHashMap<String, Value>) -> Self {
        Environment {
            scopes: vec![bindings],
        }
    }

    /// Number of scopes; 1 means only the root is active.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the current scope. The root scope is never popped.
    #[inline]
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Define a variable in the current scope, shadowing outer ones.
    #[inline]
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Look up a variable, innermost scope first.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    /// Overwrite an existing variable. Returns the index of the scope that
    /// held it (0 is the root), or `None` if no scope defines it.
    pub fn assign(&mut self, name: &str, value: Value) -> Option<usize> {
        let (index, scope) = self
            .scopes
            .iter_mut()
            .enumerate()
            .rev()
            .find(|(_, scope)| scope.contains_key(name))?;
        scope.insert(name.to_string(), value);
        Some(index)
    }

    /// Snapshot every visible binding for a closure.
    pub fn capture(&self) -> Captured {
        let mut captured = FxHashMap::default();
        for scope in &self.scopes {
            for (name, value) in scope {
                captured.insert(name.clone(), value.clone());
            }
        }
        captured
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
