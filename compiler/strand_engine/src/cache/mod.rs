//! Compiled-unit cache.
//!
//! Maps source text to the unit compiled from it. Each entry carries its own
//! [`RetentionPolicy`]:
//!
//! - `Permanent` entries stay until [`CompiledUnitCache::invalidate_all`]
//! - `Soft` entries form an LRU bounded by `soft_capacity`
//! - `Weak` entries hold a `Weak` reference and live only while a caller
//!   still holds the unit
//! - `Ephemeral` units are returned but never inserted
//!
//! Compilation is serialized per source through striped locks, so concurrent
//! callers compile a given text at most once. The cache also owns the import
//! table units are compiled against. Invalidation, or replacing that table,
//! advances a generation counter under an epoch lock; a compile that started
//! in an older generation is returned to its caller but never inserted.

use std::fmt;
use std::hash::BuildHasher;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use strand_ir::{core_imports, SymbolTable};
use strand_runtime::{CompileError, CompiledUnit, CompilerBackend};

/// Default bound on soft entries.
pub const DEFAULT_SOFT_CAPACITY: usize = 512;

/// Number of compile lock stripes.
const COMPILE_STRIPES: usize = 64;

/// Inserts between sweeps for dead weak entries.
const WEAK_SWEEP_INTERVAL: u64 = 64;

/// How strongly the cache holds an entry, weakest first.
///
/// Names parse case-insensitively, in configuration files too.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RetentionPolicy {
    Ephemeral,
    Weak,
    #[default]
    Soft,
    Permanent,
}

impl RetentionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RetentionPolicy::Ephemeral => "ephemeral",
            RetentionPolicy::Weak => "weak",
            RetentionPolicy::Soft => "soft",
            RetentionPolicy::Permanent => "permanent",
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown retention name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown retention policy '{0}' (expected permanent, soft, weak or ephemeral)")]
pub struct ParseRetentionError(String);

impl FromStr for RetentionPolicy {
    type Err = ParseRetentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permanent" => Ok(RetentionPolicy::Permanent),
            "soft" => Ok(RetentionPolicy::Soft),
            "weak" => Ok(RetentionPolicy::Weak),
            "ephemeral" => Ok(RetentionPolicy::Ephemeral),
            _ => Err(ParseRetentionError(s.to_string())),
        }
    }
}

impl TryFrom<String> for RetentionPolicy {
    type Error = ParseRetentionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RetentionPolicy> for String {
    fn from(policy: RetentionPolicy) -> Self {
        policy.as_str().to_string()
    }
}

/// Counters for diagnostics and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub compiles: u64,
    pub evictions: u64,
    /// Live entries at the time of the snapshot.
    pub entries: usize,
}

enum Slot {
    Strong(Arc<dyn CompiledUnit>),
    Weak(Weak<dyn CompiledUnit>),
}

struct Entry {
    slot: Slot,
    policy: RetentionPolicy,
    /// LRU tick of the last use; only meaningful for soft entries.
    last_used: u64,
}

impl Entry {
    fn unit(&self) -> Option<Arc<dyn CompiledUnit>> {
        match &self.slot {
            Slot::Strong(unit) => Some(Arc::clone(unit)),
            Slot::Weak(weak) => weak.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        match &self.slot {
            Slot::Strong(_) => true,
            Slot::Weak(weak) => weak.strong_count() > 0,
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    compiles: AtomicU64,
    evictions: AtomicU64,
}

/// Source text to compiled unit, shared by every evaluation of one engine.
pub struct CompiledUnitCache {
    backend: Arc<dyn CompilerBackend>,
    entries: DashMap<String, Entry>,
    soft_capacity: usize,
    compile_locks: Vec<Mutex<()>>,
    /// Import table of the current generation. Only replaced under `epoch`.
    symbols: RwLock<Arc<SymbolTable>>,
    generation: AtomicU64,
    /// Held for reading while inserting, for writing while invalidating.
    epoch: RwLock<()>,
    tick: AtomicU64,
    /// Live soft entries. Adjusted on every change of soft membership.
    soft_entries: AtomicUsize,
    inserts: AtomicU64,
    counters: Counters,
}

impl CompiledUnitCache {
    pub fn new(backend: Arc<dyn CompilerBackend>) -> Self {
        Self::with_soft_capacity(backend, DEFAULT_SOFT_CAPACITY)
    }

    pub fn with_soft_capacity(backend: Arc<dyn CompilerBackend>, soft_capacity: usize) -> Self {
        CompiledUnitCache {
            backend,
            entries: DashMap::new(),
            soft_capacity: soft_capacity.max(1),
            compile_locks: (0..COMPILE_STRIPES).map(|_| Mutex::new(())).collect(),
            symbols: RwLock::new(Arc::new(core_imports())),
            generation: AtomicU64::new(0),
            epoch: RwLock::new(()),
            tick: AtomicU64::new(0),
            soft_entries: AtomicUsize::new(0),
            inserts: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Compile against `symbols` instead of the core imports.
    #[must_use]
    pub fn with_symbols(self, symbols: Arc<SymbolTable>) -> Self {
        *self.symbols.write() = symbols;
        self
    }

    pub fn backend(&self) -> &Arc<dyn CompilerBackend> {
        &self.backend
    }

    pub fn soft_capacity(&self) -> usize {
        self.soft_capacity
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Import table of the current generation.
    pub fn symbols(&self) -> Arc<SymbolTable> {
        Arc::clone(&self.symbols.read())
    }

    /// Return the cached unit for `source`, compiling it on a miss.
    ///
    /// A hit whose requested policy is stronger than the entry's upgrades
    /// the entry; a weaker request never downgrades it. Compile errors are
    /// returned as-is and nothing is cached.
    #[tracing::instrument(
        level = "debug",
        skip(self, source, policy),
        fields(len = source.len(), policy = %policy)
    )]
    pub fn get_or_compile(
        &self,
        source: &str,
        policy: RetentionPolicy,
    ) -> Result<Arc<dyn CompiledUnit>, CompileError> {
        if let Some(unit) = self.lookup(source, policy) {
            return Ok(unit);
        }

        let _compiling = self.stripe(source).lock();
        // Another caller may have finished compiling while we waited.
        if let Some(unit) = self.lookup(source, policy) {
            return Ok(unit);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("cache miss");
        let (generation, symbols) = self.snapshot();
        let unit = self.backend.compile(source, &symbols)?;
        self.counters.compiles.fetch_add(1, Ordering::Relaxed);

        if policy != RetentionPolicy::Ephemeral {
            self.insert(source, &unit, policy, generation);
        }
        Ok(unit)
    }

    /// Whether `source` has a live entry. Does not touch LRU order.
    pub fn is_cached(&self, source: &str) -> bool {
        self.entries.get(source).is_some_and(|entry| entry.is_live())
    }

    /// Retention of the live entry for `source`, if any.
    pub fn policy_of(&self, source: &str) -> Option<RetentionPolicy> {
        self.entries
            .get(source)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.policy)
    }

    /// Drop every entry and start a new generation.
    pub fn invalidate_all(&self) {
        let _epoch = self.epoch.write();
        self.advance_generation();
    }

    /// Swap the import table and start a new generation. Units compiled
    /// against the old table are never inserted afterwards.
    pub fn replace_symbols(&self, symbols: Arc<SymbolTable>) {
        let _epoch = self.epoch.write();
        *self.symbols.write() = symbols;
        self.advance_generation();
    }

    /// Caller holds `epoch` for writing.
    fn advance_generation(&self) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let dropped = self.entries.len();
        self.entries.clear();
        self.soft_entries.store(0, Ordering::Release);
        tracing::debug!(generation, dropped, "cache invalidated");
    }

    /// Generation and import table, read together.
    fn snapshot(&self) -> (u64, Arc<SymbolTable>) {
        let _epoch = self.epoch.read();
        (self.generation(), self.symbols())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            compiles: self.counters.compiles.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn stripe(&self, source: &str) -> &Mutex<()> {
        let hash = FxBuildHasher::default().hash_one(source);
        let index = usize::try_from(hash % COMPILE_STRIPES as u64).unwrap_or(0);
        &self.compile_locks[index]
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup(
        &self,
        source: &str,
        requested: RetentionPolicy,
    ) -> Option<Arc<dyn CompiledUnit>> {
        let mut entry = self.entries.get_mut(source)?;
        let Some(unit) = entry.unit() else {
            drop(entry);
            self.entries.remove_if(source, |_, entry| !entry.is_live());
            return None;
        };

        let upgraded = requested > entry.policy;
        if upgraded {
            tracing::debug!(from = %entry.policy, to = %requested, "upgrading cache entry");
            if entry.policy == RetentionPolicy::Soft {
                self.soft_entries.fetch_sub(1, Ordering::AcqRel);
            } else if requested == RetentionPolicy::Soft {
                self.soft_entries.fetch_add(1, Ordering::AcqRel);
            }
            entry.policy = requested;
            entry.slot = Slot::Strong(Arc::clone(&unit));
        }
        if entry.policy == RetentionPolicy::Soft {
            entry.last_used = self.next_tick();
        }
        let became_soft = upgraded && entry.policy == RetentionPolicy::Soft;
        drop(entry);

        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("cache hit");
        if became_soft {
            self.enforce_soft_capacity();
        }
        Some(unit)
    }

    fn insert(
        &self,
        source: &str,
        unit: &Arc<dyn CompiledUnit>,
        policy: RetentionPolicy,
        generation: u64,
    ) {
        {
            let _epoch = self.epoch.read();
            if self.generation.load(Ordering::Acquire) != generation {
                tracing::debug!(generation, "discarding unit compiled before invalidation");
                return;
            }
            let slot = match policy {
                RetentionPolicy::Weak => Slot::Weak(Arc::downgrade(unit)),
                _ => Slot::Strong(Arc::clone(unit)),
            };
            let entry = Entry {
                slot,
                policy,
                last_used: self.next_tick(),
            };
            if policy == RetentionPolicy::Soft {
                self.soft_entries.fetch_add(1, Ordering::AcqRel);
            }
            let replaced = self.entries.insert(source.to_string(), entry);
            if replaced.is_some_and(|old| old.policy == RetentionPolicy::Soft) {
                self.soft_entries.fetch_sub(1, Ordering::AcqRel);
            }
            tracing::debug!(%policy, "cached unit");
        }

        let inserted = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if inserted % WEAK_SWEEP_INTERVAL == 0 {
            self.purge_dead_weak();
        }
        if policy == RetentionPolicy::Soft {
            self.enforce_soft_capacity();
        }
    }

    fn purge_dead_weak(&self) {
        self.entries.retain(|_, entry| entry.is_live());
    }

    /// Evict least recently used soft entries beyond capacity.
    fn enforce_soft_capacity(&self) {
        if self.soft_entries.load(Ordering::Acquire) <= self.soft_capacity {
            return;
        }
        let mut soft: Vec<(String, u64)> = self
            .entries
            .iter()
            .filter(|entry| entry.policy == RetentionPolicy::Soft)
            .map(|entry| (entry.key().clone(), entry.last_used))
            .collect();
        if soft.len() <= self.soft_capacity {
            return;
        }

        soft.sort_unstable_by_key(|(_, last_used)| *last_used);
        let excess = soft.len() - self.soft_capacity;
        for (source, last_used) in soft.into_iter().take(excess) {
            let evicted = self.entries.remove_if(&source, |_, entry| {
                entry.policy == RetentionPolicy::Soft && entry.last_used == last_used
            });
            if evicted.is_some() {
                self.soft_entries.fetch_sub(1, Ordering::AcqRel);
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(len = source.len(), "evicted soft entry");
            }
        }
    }
}

impl fmt::Debug for CompiledUnitCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledUnitCache")
            .field("language", &self.backend.language())
            .field("soft_capacity", &self.soft_capacity)
            .field("generation", &self.generation())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
