//! Structural programs through the engine.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use strand_engine::{Dialect, EngineError, EvalOptions, ScriptEngine, TranslationError};
use strand_ir::{BindingValue, Literal, StructuralProgram};
use strand_runtime::{EvalResult, HostObject, Invocation, OutputSink, Value};

/// Records the method chain called on it.
struct Path(String);

impl HostObject for Path {
    fn type_name(&self) -> &str {
        "Path"
    }

    fn invoke(&self, method: &str, args: &[Value], _inv: &Invocation) -> Option<EvalResult> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        Some(Ok(Value::host(Path(format!("{}.{method}({})", self.0, args.join(","))))))
    }

    fn describe(&self) -> String {
        self.0.clone()
    }
}

fn engine() -> ScriptEngine {
    let engine = ScriptEngine::new().with_output(OutputSink::silent());
    engine.register_native("__", Arc::new(Path("__".to_string())));
    engine
}

fn with_g() -> EvalOptions {
    EvalOptions::new().with_binding("g", Value::host(Path("g".to_string())))
}

#[test]
fn translator_fidelity() {
    let program: StructuralProgram =
        serde_json::from_str(r#"[{"op": "has", "args": ["name", "marko"]}]"#).unwrap();
    let engine = engine();
    assert_eq!(engine.translate(&program).unwrap(), r#"g.has("name","marko")"#);
}

#[test]
fn nested_programs_are_chains_not_strings() {
    let program: StructuralProgram = serde_json::from_str(
        r#"{
            "instructions": [
                {"op": "V"},
                {"op": "repeat", "args": [{"program": [{"op": "out", "args": ["knows"]}]}]},
                {"op": "times", "args": [2]}
            ]
        }"#,
    )
    .unwrap();
    let engine = engine();
    assert_eq!(
        engine.translate(&program).unwrap(),
        r#"g.V().repeat(__.out("knows")).times(2)"#
    );
    assert_eq!(
        engine.eval_program(&program, with_g()).unwrap().to_string(),
        "g.V().repeat(__.out(knows)).times(2)"
    );
}

#[test]
fn identical_text_shares_one_unit() {
    let engine = engine();
    let literal = StructuralProgram::new().with_step("has", vec!["name".into(), "marko".into()]);
    let bound = StructuralProgram::new()
        .with_step("has", vec![Literal::binding("key"), "marko".into()])
        .with_binding("key", BindingValue::Value("name".into()));
    assert_ne!(literal, bound);

    engine.eval_program(&literal, with_g()).unwrap();
    engine.eval_program(&bound, with_g()).unwrap();

    let stats = engine.cache().stats();
    assert_eq!(stats.compiles, 1);
    assert_eq!(stats.hits, 1);
    assert!(engine.cache().is_cached(r#"g.has("name","marko")"#));
}

#[test]
fn programs_can_call_session_functions() {
    let engine = engine();
    engine
        .eval("def double(x) { x * 2 }", EvalOptions::new())
        .unwrap();
    let program = StructuralProgram::new().with_step("double", vec![Literal::Long(21)]);
    let options = EvalOptions::new().with_binding("g", Value::Int(0));
    assert_eq!(engine.eval_program(&program, options).unwrap(), Value::Int(42));
}

#[test]
fn unknown_enum_fails_before_compiling() {
    let engine = engine();
    let program = StructuralProgram::new().with_step("by", vec![Literal::enum_constant("Shade", "dark")]);
    let err = engine.eval_program(&program, with_g()).unwrap_err();
    let EngineError::Translation(TranslationError::UnknownEnum(name)) = &err else {
        panic!("expected an unknown enum, got {err}");
    };
    assert_eq!(name.to_string(), "Shade.dark");
    assert!(engine.cache().is_empty());
}

#[test]
fn python_rendering_of_the_same_program() {
    let program: StructuralProgram = serde_json::from_str(
        r#"[
            {"op": "V"},
            {"op": "as", "args": ["a"]},
            {"op": "values", "args": [{"long": 5}, {"float": 1.5}, true, null]},
            {"op": "order"},
            {"op": "by", "args": [{"enum": "Order.desc"}]}
        ]"#,
    )
    .unwrap();
    let engine = engine();
    assert_eq!(
        engine.translate_with(&program, Dialect::Python, "g").unwrap(),
        r#"g.V().as_("a").values(long(5),float(1.5),True,None).order().by(Order.desc)"#
    );
    assert_eq!(
        engine.translate(&program).unwrap(),
        r#"g.V().as("a").values(5L,1.5f,true,null).order().by(Order.desc)"#
    );
}
