#![allow(clippy::unwrap_used, reason = "tests unwrap evaluation results")]

use super::*;
use crate::fetcher::StaticFetcher;
use pretty_assertions::assert_eq;
use strand_ir::{BindingValue, LineCol, Literal, QualifiedName};
use strand_runtime::EvalErrorKind;

/// Host object that records the method chain called on it.
struct Recorder(String);

impl HostObject for Recorder {
    fn type_name(&self) -> &str {
        "Traversal"
    }

    fn invoke(&self, method: &str, args: &[Value], _inv: &Invocation) -> Option<EvalResult> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        let path = format!("{}.{method}({})", self.0, args.join(","));
        Some(Ok(Value::host(Recorder(path))))
    }

    fn describe(&self) -> String {
        self.0.clone()
    }
}

fn eval(engine: &ScriptEngine, source: &str) -> Result<Value, EngineError> {
    engine.eval(source, EvalOptions::new().with_output(OutputSink::silent()))
}

fn interpreter() -> ScriptEngine {
    ScriptEngine::with_config(EngineConfig::new().with_interpreter_mode(true)).unwrap()
}

#[test]
fn test_eval_expression() {
    let engine = ScriptEngine::new();
    assert_eq!(eval(&engine, "1 + 2 * 3").unwrap(), Value::Int(7));
}

#[test]
fn test_call_local_bindings() {
    let engine = ScriptEngine::new();
    let options = EvalOptions::new()
        .with_binding("a", Value::Int(1))
        .with_binding("b", Value::Int(2));
    assert_eq!(engine.eval("a + b", options).unwrap(), Value::Int(3));
}

#[test]
fn test_output_sink_per_call() {
    let engine = ScriptEngine::new();
    let sink = OutputSink::buffer();
    engine
        .eval("out.println('hello')", EvalOptions::new().with_output(sink.clone()))
        .unwrap();
    assert_eq!(sink.get_output(), "hello\n");
}

#[test]
fn test_engine_output_default() {
    let sink = OutputSink::buffer();
    let engine = ScriptEngine::new().with_output(sink.clone());
    engine.eval("out.print(1)", EvalOptions::new()).unwrap();
    assert_eq!(sink.get_output(), "1");
}

#[test]
fn test_functions_land_in_namespace() {
    let engine = ScriptEngine::new();
    eval(&engine, "def twice(x) { x * 2 }").unwrap();
    assert!(engine.namespace().contains("twice"));
    assert_eq!(eval(&engine, "twice(21)").unwrap(), Value::Int(42));
}

#[test]
fn test_namespace_last_writer_wins() {
    let engine = ScriptEngine::new();
    eval(&engine, "def f() { 1 }").unwrap();
    eval(&engine, "def f() { 2 }").unwrap();
    assert_eq!(eval(&engine, "f()").unwrap(), Value::Int(2));
}

#[test]
fn test_namespace_beats_session_binding() {
    let engine = ScriptEngine::new();
    engine.session().bindings().set(
        "f",
        Value::native("f", |_: &[Value], _: &Invocation| Ok(Value::from("binding"))),
    );
    assert_eq!(eval(&engine, "f()").unwrap(), Value::from("binding"));

    eval(&engine, "def f() { 'namespace' }").unwrap();
    assert_eq!(eval(&engine, "f()").unwrap(), Value::from("namespace"));
}

#[test]
fn test_session_binding_is_updated_in_place() {
    let engine = ScriptEngine::new();
    engine.session().bindings().set("count", Value::Int(1));
    eval(&engine, "count = count + 1").unwrap();
    assert_eq!(engine.session().bindings().get("count"), Some(Value::Int(2)));
}

#[test]
fn test_locals_do_not_persist_without_interpreter_mode() {
    let engine = ScriptEngine::new();
    eval(&engine, "x = 5").unwrap();
    let Err(EngineError::Runtime(err)) = eval(&engine, "x + 1") else {
        panic!("expected an undefined variable");
    };
    assert_eq!(err.kind, EvalErrorKind::UndefinedVariable { name: "x".to_string() });
}

#[test]
fn test_interpreter_mode_round_trip() {
    let engine = interpreter();
    eval(&engine, "x = 5").unwrap();
    assert_eq!(eval(&engine, "x + 1").unwrap(), Value::Int(6));

    eval(&engine, "var y = x * 2").unwrap();
    assert_eq!(eval(&engine, "y").unwrap(), Value::Int(10));
}

#[test]
fn test_interpreter_mode_promotes_closures() {
    let engine = interpreter();
    eval(&engine, "inc = { n -> n + 1 }").unwrap();
    assert!(engine.namespace().contains("inc"));
    assert_eq!(eval(&engine, "inc(1)").unwrap(), Value::Int(2));
}

#[test]
fn test_failure_leaves_session_untouched() {
    let engine = interpreter();
    eval(&engine, "y = 2").unwrap();

    let result = eval(&engine, "y = 5\nz = 1\ndef h() { 1 }\n1 / 0");
    let Err(EngineError::Runtime(err)) = result else {
        panic!("expected a runtime error");
    };
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    assert_eq!(err.location.map(|at| at.line), Some(4));

    assert_eq!(engine.session().bindings().get("y"), Some(Value::Int(2)));
    assert!(!engine.session().bindings().contains("z"));
    assert!(!engine.namespace().contains("h"));
}

#[test]
fn test_compile_error() {
    let engine = ScriptEngine::new();
    let Err(EngineError::Compilation(err)) = eval(&engine, "1 +") else {
        panic!("expected a compile error");
    };
    assert_eq!(err.location.line, 1);
    assert!(!engine.cache().is_cached("1 +"));
}

#[test]
fn test_unresolved_call() {
    let engine = ScriptEngine::new();
    let Err(EngineError::UnresolvedCall { name, receiver, location }) = eval(&engine, "\nnope(1)")
    else {
        panic!("expected an unresolved call");
    };
    assert_eq!(name, "nope");
    assert!(receiver.is_some());
    assert_eq!(location, Some(LineCol { line: 2, column: 1 }));
}

#[test]
fn test_invoke_function() {
    let engine = ScriptEngine::new();
    eval(&engine, "def add(a, b) { a + b }").unwrap();
    assert_eq!(
        engine
            .invoke_function("add", &[Value::Int(1), Value::Int(2)], EvalOptions::new())
            .unwrap(),
        Value::Int(3)
    );

    let err = engine
        .invoke_function("missing", &[], EvalOptions::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "unresolved call: no function 'missing'");
}

#[test]
fn test_invoke_method_uses_namespace_fallback() {
    let engine = ScriptEngine::new();
    eval(&engine, "def shout(s) { s.toUpperCase() + '!' }").unwrap();
    let receiver = Value::host(Recorder("g".to_string()));
    assert_eq!(
        engine
            .invoke_method(&Value::Int(1), "shout", &[Value::from("hey")], EvalOptions::new())
            .unwrap(),
        Value::from("HEY!")
    );
    // Host methods are direct.
    let chained = engine
        .invoke_method(&receiver, "V", &[], EvalOptions::new())
        .unwrap();
    assert_eq!(chained.to_string(), "g.V()");
}

#[test]
fn test_retention_per_call() {
    let engine = ScriptEngine::new();
    engine
        .eval("1", EvalOptions::new().with_retention(RetentionPolicy::Permanent))
        .unwrap();
    assert_eq!(engine.cache().policy_of("1"), Some(RetentionPolicy::Permanent));

    engine
        .eval("2", EvalOptions::new().with_retention(RetentionPolicy::Ephemeral))
        .unwrap();
    assert!(!engine.cache().is_cached("2"));

    let engine = ScriptEngine::with_config(
        EngineConfig::new().with_default_retention(RetentionPolicy::Ephemeral),
    )
    .unwrap();
    eval(&engine, "3").unwrap();
    assert!(engine.cache().is_empty());
}

#[test]
fn test_interrupt() {
    let engine = ScriptEngine::new();
    let interrupt = InterruptHandle::new();
    interrupt.interrupt();
    let result = engine.eval("while (true) { }", EvalOptions::new().with_interrupt(interrupt));
    let Err(EngineError::Runtime(err)) = result else {
        panic!("expected an interrupted evaluation");
    };
    assert_eq!(err.kind, EvalErrorKind::Interrupted);
}

#[test]
fn test_eval_program() {
    let engine = ScriptEngine::new();
    engine.register_native("__", Arc::new(Recorder("__".to_string())));
    let program = StructuralProgram::new()
        .with_step("V", vec![])
        .with_step("has", vec!["name".into(), "marko".into()])
        .with_step(
            "where",
            vec![StructuralProgram::new().with_step("out", vec!["knows".into()]).into()],
        )
        .with_step("order", vec![Literal::enum_constant("Order", "desc")]);
    let options = EvalOptions::new().with_binding("g", Value::host(Recorder("g".to_string())));
    let result = engine.eval_program(&program, options).unwrap();
    assert_eq!(
        result.to_string(),
        "g.V().has(name,marko).where(__.out(knows)).order(desc)"
    );
}

#[test]
fn test_eval_program_uses_traversal_source_root() {
    let engine = ScriptEngine::new();
    let program = StructuralProgram::new()
        .with_step("E", vec![])
        .with_binding("social", BindingValue::TraversalSource);
    assert_eq!(engine.translate(&program).unwrap(), "social.E()");

    let options = EvalOptions::new().with_binding("social", Value::host(Recorder("s".to_string())));
    assert_eq!(engine.eval_program(&program, options).unwrap().to_string(), "s.E()");
}

#[test]
fn test_translation_error_precedes_compilation() {
    let engine = ScriptEngine::new();
    let program = StructuralProgram::new().with_step("is", vec![Literal::binding("missing")]);
    let err = engine.eval_program(&program, EvalOptions::new()).unwrap_err();
    assert!(matches!(err, EngineError::Translation(_)));
    assert_eq!(engine.cache().stats().compiles, 0);
}

#[test]
fn test_translate_with_python() {
    let engine = ScriptEngine::new();
    let program = StructuralProgram::new().with_step("in", vec![Literal::Long(1)]);
    assert_eq!(
        engine.translate_with(&program, Dialect::Python, "t").unwrap(),
        "t.in_(long(1))"
    );
}

#[test]
fn test_init_scripts() {
    let config = EngineConfig::new()
        .with_init_script("def twice(x) { x * 2 }")
        .with_init_script("this is not valid")
        .with_init_script("missing()");
    let engine = ScriptEngine::with_config(config).unwrap();
    assert_eq!(eval(&engine, "twice(4)").unwrap(), Value::Int(8));
}

#[test]
fn test_missing_init_script_file_fails_construction() {
    let config = EngineConfig::new().with_init_script_file("/nonexistent/init.strand");
    let err = ScriptEngine::with_config(config).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_invalid_config_fails_construction() {
    let err = ScriptEngine::with_config(EngineConfig::new().with_max_call_depth(0)).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_max_call_depth() {
    let engine = ScriptEngine::with_config(EngineConfig::new().with_max_call_depth(10)).unwrap();
    let Err(EngineError::Runtime(err)) = eval(&engine, "def f(n) { f(n + 1) }\nf(0)") else {
        panic!("expected the recursion limit");
    };
    assert_eq!(err.kind, EvalErrorKind::RecursionLimit { depth: 10 });
}

#[test]
fn test_add_imports_invalidates() {
    let engine = ScriptEngine::with_config(
        EngineConfig::new().with_init_script("def twice(x) { x * 2 }"),
    )
    .unwrap();
    engine.session().bindings().set("kept", Value::Int(1));
    assert!(matches!(eval(&engine, "red"), Err(EngineError::Runtime(_))));
    eval(&engine, "def temp() { 0 }").unwrap();
    let generation = engine.cache().generation();

    engine
        .add_imports(&SymbolTable::new().with_enum_constants("Color", &["red"]))
        .unwrap();
    assert_eq!(engine.cache().generation(), generation + 1);
    assert_eq!(
        eval(&engine, "red").unwrap(),
        Value::Enum(QualifiedName::new("Color", "red"))
    );
    assert!(!engine.namespace().contains("temp"));
    assert!(engine.namespace().contains("twice"));
    assert_eq!(engine.session().bindings().get("kept"), Some(Value::Int(1)));
}

#[test]
fn test_use_artifact() {
    struct Math;
    impl HostObject for Math {
        fn type_name(&self) -> &str {
            "Math"
        }
        fn invoke(&self, method: &str, args: &[Value], _: &Invocation) -> Option<EvalResult> {
            (method == "square").then(|| {
                let n = args[0].as_int().unwrap_or(0);
                Ok(Value::Int(n * n))
            })
        }
    }

    let artifact = Artifact::new("org.example", "math", "1.0");
    let plugin = PluginDescriptor::new("math")
        .with_imports(SymbolTable::new().with_function("org.example.Math", "square"))
        .with_native("Math", Arc::new(Math))
        .with_init_script("def cube(n) { n * Math.square(n) }");
    let fetcher = StaticFetcher::new().with(artifact.clone(), vec![plugin]);
    let engine = ScriptEngine::new().with_fetcher(Arc::new(fetcher));

    engine.use_artifact(artifact.clone()).unwrap();
    assert_eq!(engine.artifacts(), vec![artifact]);
    assert_eq!(eval(&engine, "Math.square(4)").unwrap(), Value::Int(16));
    assert_eq!(eval(&engine, "cube(3)").unwrap(), Value::Int(27));

    engine.reset().unwrap();
    assert_eq!(eval(&engine, "cube(2)").unwrap(), Value::Int(8));
}

#[test]
fn test_use_artifact_failures() {
    let engine = ScriptEngine::new();
    let artifact: Artifact = "org.example:none:1.0".parse().unwrap();
    let err = engine.use_artifact(artifact.clone()).unwrap_err();
    assert!(matches!(err, EngineError::Fetch(FetchError::NoFetcher)));

    let engine = ScriptEngine::new().with_fetcher(Arc::new(StaticFetcher::new()));
    let err = engine.use_artifact(artifact).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot fetch org.example:none:1.0: not published"
    );
    assert!(engine.artifacts().is_empty());

    assert!(matches!(
        "org.example:none".parse::<Artifact>(),
        Err(FetchError::InvalidCoordinates(_))
    ));
}

#[test]
fn test_reset_clears_session() {
    let engine = interpreter();
    eval(&engine, "x = 1").unwrap();
    eval(&engine, "def f() { 1 }").unwrap();
    engine.register_native("__", Arc::new(Recorder("__".to_string())));

    engine.reset().unwrap();
    assert!(engine.session().bindings().is_empty());
    assert!(engine.namespace().is_empty());
    assert!(engine.cache().is_empty());
    // Natives registered on the engine survive.
    assert_eq!(eval(&engine, "__.out()").unwrap().to_string(), "__.out()");
}

#[test]
fn test_engine_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ScriptEngine>();
}

#[test]
fn test_debug_output() {
    let engine = ScriptEngine::new();
    assert!(format!("{engine:?}").starts_with("ScriptEngine { language: \"strand\""));
}
