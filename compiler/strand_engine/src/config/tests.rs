#![allow(clippy::unwrap_used, reason = "tests unwrap configuration results")]

use super::*;
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert!(!config.interpreter_mode);
    assert_eq!(config.default_retention, RetentionPolicy::Soft);
    assert_eq!(config.soft_capacity, 512);
    assert_eq!(config.max_call_depth, 1000);
    assert!(config.imports.is_empty());
}

#[test]
fn test_empty_json_is_default() {
    assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
}

#[test]
fn test_full_json() {
    let config = EngineConfig::from_json_str(
        r#"{
            "interpreter_mode": true,
            "default_retention": "permanent",
            "soft_capacity": 16,
            "imports": { "enum_constants": ["Color.red"] },
            "init_scripts": ["def twice(x) { x * 2 }"],
            "max_call_depth": 64
        }"#,
    )
    .unwrap();
    assert!(config.interpreter_mode);
    assert_eq!(config.default_retention, RetentionPolicy::Permanent);
    assert_eq!(config.soft_capacity, 16);
    assert!(config.imports.has_type("Color"));
    assert_eq!(config.init_scripts, vec!["def twice(x) { x * 2 }".to_string()]);
    assert_eq!(config.max_call_depth, 64);
}

#[test]
fn test_unknown_field_is_rejected() {
    let err = EngineConfig::from_json_str(r#"{ "interpreter": true }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().contains("unknown field `interpreter`"));
}

#[test]
fn test_bad_retention_name() {
    let err = EngineConfig::from_json_str(r#"{ "default_retention": "forever" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_zero_capacity_is_invalid() {
    let err = EngineConfig::from_json_str(r#"{ "soft_capacity": 0 }"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: soft_capacity must be greater than zero"
    );
}

#[test]
fn test_builder() {
    let config = EngineConfig::new()
        .with_interpreter_mode(true)
        .with_default_retention(RetentionPolicy::Weak)
        .with_soft_capacity(3)
        .with_imports(SymbolTable::new().with_type("a.B"))
        .with_init_script("x = 1")
        .with_max_call_depth(10);
    assert!(config.interpreter_mode);
    assert_eq!(config.default_retention, RetentionPolicy::Weak);
    assert_eq!(config.soft_capacity, 3);
    assert_eq!(config.imports.resolve_type("B"), Some("a.B"));
    assert_eq!(config.init_scripts, vec!["x = 1".to_string()]);
    assert_eq!(config.max_call_depth, 10);
}

#[test]
fn test_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "interpreter_mode": true }}"#).unwrap();
    let config = EngineConfig::from_json_file(file.path()).unwrap();
    assert!(config.interpreter_mode);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = EngineConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().starts_with("cannot read "));
}

#[test]
fn test_init_script_files_are_joined_by_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "def f() {{\r\n  1\r\n}}\r\n").unwrap();
    let config = EngineConfig::new()
        .with_init_script("x = 0")
        .with_init_script_file(file.path());
    assert_eq!(
        config.load_init_scripts().unwrap(),
        vec!["x = 0".to_string(), "def f() {\n  1\n}".to_string()]
    );
}
