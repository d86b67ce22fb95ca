//! Session state across evaluations and threads.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use strand_engine::{EngineConfig, EngineError, EvalOptions, ScriptEngine};
use strand_runtime::{HostObject, Invocation, OutputSink, Value};

fn quiet() -> EvalOptions {
    EvalOptions::new().with_output(OutputSink::silent())
}

/// Receiver without a method named `f`.
struct Plain;

impl HostObject for Plain {
    fn type_name(&self) -> &str {
        "Plain"
    }

    fn invoke(
        &self,
        method: &str,
        _args: &[Value],
        _inv: &Invocation,
    ) -> Option<strand_runtime::EvalResult> {
        (method == "own").then(|| Ok(Value::from("own")))
    }
}

#[test]
fn dispatch_prefers_namespace_over_session_binding() {
    let engine = ScriptEngine::new();
    engine.eval("def f() { 'namespace' }", quiet()).unwrap();
    engine.session().bindings().set(
        "f",
        Value::native("f", |_: &[Value], _: &Invocation| Ok(Value::from("binding"))),
    );

    let options = quiet().with_binding("r", Value::host(Plain));
    assert_eq!(engine.eval("r.f()", options.clone()).unwrap(), Value::from("namespace"));
    assert_eq!(engine.eval("r.own()", options).unwrap(), Value::from("own"));
}

#[test]
fn scope_callable_is_the_last_tier() {
    let engine = ScriptEngine::new();
    let options = quiet()
        .with_binding("r", Value::host(Plain))
        .with_binding(
            "g",
            Value::native("g", |args: &[Value], _: &Invocation| Ok(Value::Int(args.len() as i64))),
        );
    assert_eq!(engine.eval("r.g(1, 2)", options).unwrap(), Value::Int(2));
}

#[test]
fn exhausted_dispatch_is_an_unresolved_call() {
    let engine = ScriptEngine::new();
    let options = quiet().with_binding("r", Value::host(Plain));
    let err = engine.eval("r.missing()", options).unwrap_err();
    let EngineError::UnresolvedCall { name, receiver, .. } = &err else {
        panic!("expected an unresolved call, got {err}");
    };
    assert_eq!(name, "missing");
    assert_eq!(receiver.as_deref(), Some("Plain"));
    assert_eq!(err.to_string(), "unresolved call: no method 'missing' on Plain (at 1:1)");
}

#[test]
fn interpreter_mode_round_trip() {
    let engine =
        ScriptEngine::with_config(EngineConfig::new().with_interpreter_mode(true)).unwrap();
    engine.eval("x = 5", quiet()).unwrap();
    assert_eq!(engine.eval("x + 1", quiet()).unwrap(), Value::Int(6));
    assert_eq!(engine.session().bindings().get("x"), Some(Value::Int(5)));
}

#[test]
fn runtime_error_leaves_session_unchanged() {
    let engine =
        ScriptEngine::with_config(EngineConfig::new().with_interpreter_mode(true)).unwrap();
    engine.eval("kept = 1\ndef before() { 1 }", quiet()).unwrap();
    let bindings = engine.session().bindings().snapshot();
    let functions = engine.namespace().names();

    let err = engine
        .eval("kept = 2\nfresh = 3\ndef after() { 2 }\n[1, 2][5]", quiet())
        .unwrap_err();
    assert!(matches!(err, EngineError::Runtime(_)));

    assert_eq!(engine.session().bindings().snapshot(), bindings);
    assert_eq!(engine.namespace().names(), functions);
}

#[test]
fn output_goes_to_the_callers_sink() {
    let engine = ScriptEngine::new();
    let first = OutputSink::buffer();
    let second = OutputSink::buffer();
    let script = "def greet(who) { out.println('hi ' + who) }\ngreet(name)";

    engine
        .eval(script, EvalOptions::new().with_output(first.clone()).with_binding("name", Value::from("a")))
        .unwrap();
    engine
        .eval(script, EvalOptions::new().with_output(second.clone()).with_binding("name", Value::from("b")))
        .unwrap();

    assert_eq!(first.get_output(), "hi a\n");
    assert_eq!(second.get_output(), "hi b\n");
}

#[test]
fn shared_engine_across_threads() {
    let engine = Arc::new(ScriptEngine::new());
    engine.eval("def square(n) { n * n }", quiet()).unwrap();

    let total: i64 = (0..100_i64)
        .into_par_iter()
        .map(|i| {
            let options = quiet().with_binding("i", Value::Int(i));
            engine.eval("square(i)", options).unwrap().as_int().unwrap()
        })
        .sum();

    assert_eq!(total, (0..100_i64).map(|i| i * i).sum::<i64>());
    assert_eq!(engine.cache().stats().compiles, 2);
}

#[test]
fn concurrent_definitions_all_land() {
    let engine = ScriptEngine::new();
    (0..16).into_par_iter().for_each(|i| {
        engine
            .eval(&format!("def f{i}() {{ {i} }}"), quiet())
            .unwrap();
    });
    assert_eq!(engine.namespace().len(), 16);
    assert_eq!(engine.eval("f7() + f8()", quiet()).unwrap(), Value::Int(15));
}
