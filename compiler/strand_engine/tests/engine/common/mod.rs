//! Instrumented compiler backends.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use strand_ir::SymbolTable;
use strand_runtime::{CompileError, CompiledUnit, CompilerBackend};
use strand_script::StrandBackend;

/// Counts compilations and optionally slows them down so concurrent callers
/// overlap.
#[derive(Default)]
pub struct CountingBackend {
    inner: StrandBackend,
    compiles: AtomicUsize,
    delay: Duration,
}

impl CountingBackend {
    pub fn with_delay(delay: Duration) -> Self {
        CountingBackend {
            delay,
            ..Self::default()
        }
    }

    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl CompilerBackend for CountingBackend {
    fn language(&self) -> &str {
        self.inner.language()
    }

    fn compile(
        &self,
        source: &str,
        symbols: &Arc<SymbolTable>,
    ) -> Result<Arc<dyn CompiledUnit>, CompileError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.compile(source, symbols)
    }
}

/// Holds its first compilation between two barrier waits: one when the
/// compile has started, one before it is allowed to finish.
pub struct GatedBackend {
    inner: StrandBackend,
    gate: Barrier,
    armed: AtomicBool,
    compiles: AtomicUsize,
}

impl GatedBackend {
    pub fn new() -> Self {
        GatedBackend {
            inner: StrandBackend::new(),
            gate: Barrier::new(2),
            armed: AtomicBool::new(true),
            compiles: AtomicUsize::new(0),
        }
    }

    /// Block until the gated compile has started.
    pub fn wait_started(&self) {
        self.gate.wait();
    }

    /// Let the gated compile finish.
    pub fn release(&self) {
        self.gate.wait();
    }

    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl CompilerBackend for GatedBackend {
    fn language(&self) -> &str {
        self.inner.language()
    }

    fn compile(
        &self,
        source: &str,
        symbols: &Arc<SymbolTable>,
    ) -> Result<Arc<dyn CompiledUnit>, CompileError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if self.armed.swap(false, Ordering::SeqCst) {
            self.gate.wait();
            self.gate.wait();
        }
        self.inner.compile(source, symbols)
    }
}
