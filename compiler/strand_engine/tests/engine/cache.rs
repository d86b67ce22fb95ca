//! Cache behavior under concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use strand_engine::{
    CompiledUnitCache, EngineConfig, EngineError, EvalOptions, RetentionPolicy, ScriptEngine,
};
use strand_ir::SymbolTable;
use strand_runtime::{EvalErrorKind, Value};

use crate::common::{CountingBackend, GatedBackend};

#[test]
fn concurrent_callers_share_one_compile() {
    let backend = Arc::new(CountingBackend::with_delay(Duration::from_millis(20)));
    let cache = CompiledUnitCache::new(backend.clone());

    let units: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| {
            cache
                .get_or_compile("def f() { 1 }\nf()", RetentionPolicy::Soft)
                .unwrap()
        })
        .collect();

    assert_eq!(backend.compiles(), 1);
    assert!(units.iter().all(|unit| Arc::ptr_eq(unit, &units[0])));
    assert_eq!(cache.stats().hits, 31);
}

#[test]
fn distinct_sources_compile_independently() {
    let backend = Arc::new(CountingBackend::default());
    let cache = CompiledUnitCache::new(backend.clone());

    (0..200).into_par_iter().for_each(|i| {
        let source = format!("{} + 1", i % 20);
        cache
            .get_or_compile(&source, RetentionPolicy::Permanent)
            .unwrap();
    });

    assert_eq!(backend.compiles(), 20);
    assert_eq!(cache.len(), 20);
}

#[test]
fn soft_capacity_holds_under_concurrency() {
    let backend = Arc::new(CountingBackend::default());
    let cache = CompiledUnitCache::with_soft_capacity(backend, 8);

    (0..100).into_par_iter().for_each(|i| {
        cache
            .get_or_compile(&i.to_string(), RetentionPolicy::Soft)
            .unwrap();
    });

    assert!(cache.len() <= 8);
    assert_eq!(cache.stats().evictions, 100 - cache.len() as u64);
}

#[test]
fn in_flight_compile_is_not_inserted_after_invalidation() {
    let backend = Arc::new(GatedBackend::new());
    let cache = CompiledUnitCache::new(backend.clone());

    let stale = std::thread::scope(|scope| {
        let compile = scope.spawn(|| {
            cache
                .get_or_compile("40 + 2", RetentionPolicy::Permanent)
                .unwrap()
        });
        backend.wait_started();
        cache.invalidate_all();
        backend.release();
        compile.join().unwrap()
    });

    // The caller still got its unit, but the cache did not keep it.
    assert!(!cache.is_cached("40 + 2"));
    let fresh = cache
        .get_or_compile("40 + 2", RetentionPolicy::Permanent)
        .unwrap();
    assert!(!Arc::ptr_eq(&stale, &fresh));
    assert!(cache.is_cached("40 + 2"));
    assert_eq!(backend.compiles(), 2);
}

#[test]
fn invalidation_during_concurrent_reads() {
    let backend = Arc::new(CountingBackend::default());
    let cache = CompiledUnitCache::new(backend.clone());

    (0..64).into_par_iter().for_each(|i| {
        if i % 16 == 0 {
            cache.invalidate_all();
        } else {
            let unit = cache.get_or_compile("7", RetentionPolicy::Soft);
            assert!(unit.is_ok());
        }
    });

    assert_eq!(cache.generation(), 4);
    // Whatever survived was compiled in the current generation.
    let a = cache.get_or_compile("7", RetentionPolicy::Soft).unwrap();
    let b = cache.get_or_compile("7", RetentionPolicy::Soft).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn imports_added_during_compile_reach_waiting_callers() {
    let backend = Arc::new(GatedBackend::new());
    let engine = ScriptEngine::with_backend(EngineConfig::new(), backend.clone()).unwrap();
    let mut imports = SymbolTable::new();
    imports.add_type("pkg.Foo");

    let (first, second) = std::thread::scope(|scope| {
        let first = scope.spawn(|| engine.eval("Foo", EvalOptions::new()));
        backend.wait_started();
        // Queued behind the gated compile of the same source.
        let second = scope.spawn(|| engine.eval("Foo", EvalOptions::new()));
        std::thread::sleep(Duration::from_millis(20));
        engine.add_imports(&imports).unwrap();
        backend.release();
        (first.join().unwrap(), second.join().unwrap())
    });

    // The call already compiling keeps the imports it started with.
    match first {
        Err(EngineError::Runtime(err)) => assert_eq!(
            err.kind,
            EvalErrorKind::UndefinedVariable {
                name: "Foo".to_string()
            }
        ),
        other => panic!("expected an undefined variable, got {other:?}"),
    }
    assert_eq!(second.unwrap(), Value::Type("Foo".into()));
    assert_eq!(
        engine.eval("Foo", EvalOptions::new()).unwrap(),
        Value::Type("Foo".into())
    );
    assert_eq!(backend.compiles(), 2);
}

#[test]
fn concurrent_add_imports_keep_every_table() {
    let engine = ScriptEngine::new();
    (0..8).into_par_iter().for_each(|i| {
        let mut imports = SymbolTable::new();
        imports.add_type(&format!("pkg.Type{i}"));
        engine.add_imports(&imports).unwrap();
    });

    let symbols = engine.symbols();
    assert!((0..8).all(|i| symbols.has_type(&format!("Type{i}"))));
    assert_eq!(engine.cache().generation(), 8);
}
