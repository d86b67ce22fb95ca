//! Engines built from configuration files.

use std::io::Write;

use pretty_assertions::assert_eq;
use strand_engine::{EngineConfig, EngineError, EvalOptions, RetentionPolicy, ScriptEngine};
use strand_runtime::{OutputSink, Value};

fn quiet() -> EvalOptions {
    EvalOptions::new().with_output(OutputSink::silent())
}

#[test]
fn engine_from_json_file_with_init_script_file() {
    let dir = tempfile::tempdir().unwrap();

    let script_path = dir.path().join("init.strand");
    let mut script = std::fs::File::create(&script_path).unwrap();
    writeln!(script, "def greet(name) {{").unwrap();
    writeln!(script, "  'hello ' + name").unwrap();
    writeln!(script, "}}").unwrap();

    let config_path = dir.path().join("engine.json");
    let json = serde_json::json!({
        "interpreter_mode": true,
        "default_retention": "Permanent",
        "init_scripts": ["base = 10"],
        "init_script_files": [script_path],
        "imports": { "enum_constants": ["demo.Color.red"] }
    });
    std::fs::write(&config_path, json.to_string()).unwrap();

    let config = EngineConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.default_retention, RetentionPolicy::Permanent);

    let engine = ScriptEngine::with_config(config).unwrap();
    assert_eq!(
        engine.eval("greet('strand')", quiet()).unwrap(),
        Value::from("hello strand")
    );
    // Interpreter mode applies to init scripts too.
    assert_eq!(engine.eval("base + 1", quiet()).unwrap(), Value::Int(11));
    assert_eq!(engine.eval("red.name()", quiet()).unwrap(), Value::from("red"));
    assert_eq!(
        engine.cache().policy_of("base + 1"),
        Some(RetentionPolicy::Permanent)
    );
}

#[test]
fn invalid_config_file_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "soft_capacity": "lots" }}"#).unwrap();
    let err = EngineConfig::from_json_file(file.path()).unwrap_err();
    assert!(EngineError::from(err).to_string().starts_with("invalid configuration"));
}

#[test]
fn unreadable_init_script_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::new().with_init_script_file(dir.path().join("missing.strand"));
    let err = ScriptEngine::with_config(config).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}
