//! Session namespace: functions shared by every evaluation on one engine.
//!
//! Populated after each successful top-level execution with the functions the
//! unit defines (and, in interpreter mode, with callable locals). Consulted by
//! the dispatch chain when a direct call does not resolve.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::value::Callable;

/// Concurrent name -> callable map, last writer wins.
#[derive(Default)]
pub struct SessionNamespace {
    functions: DashMap<String, Arc<dyn Callable>>,
}

impl SessionNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, callable: Arc<dyn Callable>) {
        let name = name.into();
        tracing::debug!(function = %name, "registering session function");
        self.functions.insert(name, callable);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Callable>> {
        self.functions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn clear(&self) {
        self.functions.clear();
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Sorted names of every registered function.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for SessionNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionNamespace")
            .field("functions", &self.names())
            .finish()
    }
}
