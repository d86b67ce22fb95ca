use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_factory_sets_kind_and_message() {
    let err = undefined_variable("x");
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedVariable {
            name: "x".to_string()
        }
    );
    assert_eq!(err.message, "undefined variable: x");
}

#[test]
fn test_unresolved_call_messages() {
    assert_eq!(
        unresolved_call("f", Some("str")).message,
        "no method 'f' on str"
    );
    assert_eq!(unresolved_call("f", None).message, "no function 'f'");
    assert!(unresolved_call("f", None).is_unresolved_call());
}

#[test]
fn test_arity_message_pluralization() {
    assert_eq!(
        wrong_arg_count("f", 1, 2).message,
        "f expects 1 argument, got 2"
    );
    assert_eq!(
        wrong_arg_count("g", 2, 0).message,
        "g expects 2 arguments, got 0"
    );
}

#[test]
fn test_innermost_location_wins() {
    let err = division_by_zero()
        .at(LineCol { line: 2, column: 5 })
        .at(LineCol { line: 1, column: 1 });
    assert_eq!(err.location, Some(LineCol { line: 2, column: 5 }));
    assert_eq!(err.to_string(), "division by zero (at 2:5)");
}

#[test]
fn test_backtrace_outermost_first() {
    let err = interrupted().in_frame("inner").in_frame("outer");
    assert_eq!(err.backtrace.frames(), ["outer", "inner"]);
    assert_eq!(err.backtrace.to_string(), "  0: outer\n  1: inner\n");
}
