#![allow(clippy::unwrap_used, reason = "test scripts are known to compile")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use strand_ir::{core_imports, LineCol, QualifiedName};
use strand_runtime::{
    CompilerBackend, EvalErrorKind, EvalResult, EvaluationContext, InterruptHandle, Invocation,
    OutputSink, Session, Value,
};

use crate::StrandBackend;

fn eval_with(session: &Arc<Session>, ctx: EvaluationContext, source: &str) -> EvalResult {
    let unit = StrandBackend::new()
        .compile(source, &Arc::new(core_imports()))
        .unwrap();
    unit.run(&Invocation::new(ctx, Arc::clone(session)))
}

fn eval(source: &str) -> EvalResult {
    let session = Arc::new(Session::new());
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    eval_with(&session, ctx, source)
}

fn eval_ok(source: &str) -> Value {
    match eval(source) {
        Ok(value) => value,
        Err(err) => panic!("{source:?} failed: {err}"),
    }
}

fn eval_err_kind(source: &str) -> EvalErrorKind {
    match eval(source) {
        Ok(value) => panic!("{source:?} should fail, got {value}"),
        Err(err) => err.kind,
    }
}

fn ints(values: &[i64]) -> Value {
    Value::list(values.iter().copied().map(Value::Int).collect())
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval_ok("1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval_ok("(1 + 2) * 3"), Value::Int(9));
    assert_eq!(eval_ok("7 / 2"), Value::Int(3));
    assert_eq!(eval_ok("7 % 4"), Value::Int(3));
    assert_eq!(eval_ok("7 / 2.0"), Value::Float(3.5));
    assert_eq!(eval_ok("-3 + 1"), Value::Int(-2));
    assert_eq!(eval_ok("1.5d + 1"), Value::Float(2.5));
}

#[test]
fn test_concatenation() {
    assert_eq!(eval_ok("\"a\" + 1"), Value::from("a1"));
    assert_eq!(eval_ok("1 + \"a\""), Value::from("1a"));
    assert_eq!(eval_ok("\"ab\" * 2"), Value::from("abab"));
    assert_eq!(eval_ok("[1] + 2"), ints(&[1, 2]));
    assert_eq!(eval_ok("[1] + [2, 3]"), ints(&[1, 2, 3]));
}

#[test]
fn test_comparison_and_logic() {
    assert_eq!(eval_ok("1 < 2 && 2 <= 2"), Value::Bool(true));
    assert_eq!(eval_ok("\"b\" > \"a\""), Value::Bool(true));
    assert_eq!(eval_ok("1 == 1.0"), Value::Bool(true));
    assert_eq!(eval_ok("!(1 != 1)"), Value::Bool(true));
    // the right side would fail if evaluated
    assert_eq!(eval_ok("false && nope"), Value::Bool(false));
    assert_eq!(eval_ok("true || nope"), Value::Bool(true));
}

#[test]
fn test_arithmetic_errors() {
    assert_eq!(
        eval_err_kind("9223372036854775807 + 1"),
        EvalErrorKind::IntegerOverflow {
            operation: "addition".into()
        }
    );
    assert_eq!(eval_err_kind("1 / 0"), EvalErrorKind::DivisionByZero);
    assert!(matches!(
        eval_err_kind("true - 1"),
        EvalErrorKind::InvalidBinaryOp { .. }
    ));
}

#[test]
fn test_error_location() {
    let err = eval("var a = 1\nvar b = a / 0").unwrap_err();
    assert_eq!(err.location, Some(LineCol { line: 2, column: 9 }));

    let err = eval("nope + 1").unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedVariable {
            name: "nope".into()
        }
    );
    assert_eq!(err.location, Some(LineCol { line: 1, column: 1 }));
}

#[test]
fn test_functions_and_recursion() {
    let source = "def fact(n) {\n  if (n <= 1) { return 1 }\n  return n * fact(n - 1)\n}\nfact(10)";
    assert_eq!(eval_ok(source), Value::Int(3_628_800));
}

#[test]
fn test_last_statement_is_the_result() {
    assert_eq!(eval_ok("def f() { 1; 2 }\nf()"), Value::Int(2));
    assert_eq!(eval_ok("var x = 5"), Value::Int(5));
    assert_eq!(eval_ok(""), Value::Null);
}

#[test]
fn test_function_arity() {
    assert_eq!(
        eval_err_kind("def f(a, b) { a }\nf(1)"),
        EvalErrorKind::ArityMismatch {
            name: "f".into(),
            expected: 2,
            got: 1,
        }
    );
}

#[test]
fn test_recursion_limit() {
    let session = Arc::new(Session::new().with_max_call_depth(50));
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    let err = eval_with(&session, ctx, "def f(n) { f(n + 1) }\nf(0)").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::RecursionLimit { depth: 50 });
    assert_eq!(err.backtrace.frames().first().map(String::as_str), Some("f"));
}

#[test]
fn test_functions_do_not_see_script_locals() {
    assert!(matches!(
        eval_err_kind("var hidden = 1\ndef f() { hidden }\nf()"),
        EvalErrorKind::UndefinedVariable { .. }
    ));
}

#[test]
fn test_closures() {
    assert_eq!(eval_ok("var k = 10\nvar add = { x -> x + k }\nadd(5)"), Value::Int(15));
    assert_eq!(eval_ok("[1, 2, 3].collect { it * 2 }"), ints(&[2, 4, 6]));
    assert_eq!(
        eval_ok("[1, 2, 3].inject(0) { acc, x -> acc + x }"),
        Value::Int(6)
    );
    assert_eq!(eval_ok("{ -> 7 }()"), Value::Int(7));
    assert_eq!(eval_ok("var c = { it }\nc()"), Value::Null);
}

#[test]
fn test_closures_capture_by_value() {
    assert_eq!(eval_ok("var n = 1\nvar c = { n }\nn = 2\nc()"), Value::Int(1));
}

#[test]
fn test_closure_arity() {
    assert!(matches!(
        eval_err_kind("var c = { a, b -> a }\nc(1)"),
        EvalErrorKind::ArityMismatch { expected: 2, got: 1, .. }
    ));
    assert!(matches!(
        eval_err_kind("{ it }(1, 2)"),
        EvalErrorKind::ArityMismatch { expected: 1, got: 2, .. }
    ));
}

#[test]
fn test_loops() {
    assert_eq!(
        eval_ok("var total = 0\nfor (x in [1, 2, 3]) { total = total + x }\ntotal"),
        Value::Int(6)
    );
    assert_eq!(
        eval_ok("var i = 0\nwhile (i < 5) { i = i + 1 }\ni"),
        Value::Int(5)
    );
    assert_eq!(
        eval_ok("var keys = \"\"\nfor (e in [b: 2, a: 1]) { keys = keys + e.key }\nkeys"),
        Value::from("ab")
    );
    assert_eq!(
        eval_ok("def first(xs) { for (x in xs) { return x } }\nfirst([4, 5])"),
        Value::Int(4)
    );
}

#[test]
fn test_block_scoping() {
    assert!(matches!(
        eval_err_kind("if (true) { var inner = 1 }\ninner"),
        EvalErrorKind::UndefinedVariable { .. }
    ));
}

#[test]
fn test_collections_and_indexing() {
    assert_eq!(eval_ok("var m = [a: 1]\nm[\"b\"] = 2\nm.b + m[\"a\"]"), Value::Int(3));
    assert_eq!(eval_ok("var l = [1, 2]\nl[-1] = 5\nl"), ints(&[1, 5]));
    assert_eq!(eval_ok("var l = [1]\nl[2] = 3\nl.size()"), Value::Int(3));
    assert_eq!(eval_ok("[1, 2, 3][-1]"), Value::Int(3));
    assert_eq!(eval_ok("\"abc\"[1]"), Value::from("b"));
    assert_eq!(eval_ok("[:].size()"), Value::Int(0));
    assert_eq!(eval_ok("[a: 1].missing"), Value::Null);
    assert_eq!(
        eval_err_kind("[1][3]"),
        EvalErrorKind::IndexOutOfBounds { index: 3 }
    );
}

#[test]
fn test_scope_resolver_reads_and_writes() {
    let session = Arc::new(Session::new());
    session.bindings().set("s", Value::Int(1));
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent())
        .with_local("x", Value::Int(4));

    let result = eval_with(&session, ctx.clone(), "y = x * 2\ns = 9\ny + s");
    assert_eq!(result, Ok(Value::Int(17)));
    assert_eq!(ctx.local("y"), Some(Value::Int(8)));
    assert_eq!(ctx.session_value("s"), Some(Value::Int(9)));
    // staged until the engine commits
    assert_eq!(session.bindings().get("s"), Some(Value::Int(1)));
}

#[test]
fn test_script_locals_shadow_bindings() {
    let session = Arc::new(Session::new());
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent())
        .with_local("x", Value::Int(4));
    let result = eval_with(&session, ctx.clone(), "var x = 1\nx = 2\nx");
    assert_eq!(result, Ok(Value::Int(2)));
    assert_eq!(ctx.local("x"), Some(Value::Int(4)));
}

#[test]
fn test_output() {
    let session = Arc::new(Session::new());
    let out = OutputSink::buffer();
    let ctx = EvaluationContext::new(session.bindings().clone(), out.clone());
    let source = "out.println(\"hi\")\nprintln(\"there\", 1)\nout.print(2)";
    assert_eq!(eval_with(&session, ctx, source), Ok(Value::Null));
    assert_eq!(out.get_output(), "hi\nthere1\n2");
}

#[test]
fn test_context_name() {
    let session = Arc::new(Session::new());
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    let result = eval_with(&session, ctx.clone(), "context.set(\"k\", 3)\nk + 1");
    assert_eq!(result, Ok(Value::Int(4)));
}

#[test]
fn test_imported_types_and_enums() {
    assert_eq!(
        eval_ok("desc"),
        Value::Enum(QualifiedName::new("Order", "desc"))
    );
    assert_eq!(
        eval_ok("Order.asc"),
        Value::Enum(QualifiedName::new("Order", "asc"))
    );
    assert_eq!(eval_ok("T.id.name()"), Value::from("id"));
    assert_eq!(eval_ok("Order"), Value::Type("Order".into()));
}

#[test]
fn test_unqualified_call_falls_back_to_namespace() {
    let session = Arc::new(Session::new());
    session.namespace().register(
        "helper",
        Arc::new(strand_runtime::NativeFunction::new(
            "helper",
            |args: &[Value], _: &Invocation| Ok(Value::Int(args[0].as_int().unwrap_or(0) * 10)),
        )),
    );
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    assert_eq!(eval_with(&session, ctx, "helper(2)"), Ok(Value::Int(20)));
}

#[test]
fn test_own_function_beats_namespace() {
    let session = Arc::new(Session::new());
    session.namespace().register(
        "f",
        Arc::new(strand_runtime::NativeFunction::new(
            "f",
            |_: &[Value], _: &Invocation| Ok(Value::from("namespace")),
        )),
    );
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    assert_eq!(
        eval_with(&session, ctx, "def f() { \"own\" }\nf()"),
        Ok(Value::from("own"))
    );
}

#[test]
fn test_unresolved_call_names_the_script() {
    assert_eq!(
        eval_err_kind("missing()"),
        EvalErrorKind::UnresolvedCall {
            name: "missing".into(),
            receiver: Some("Script1".into()),
        }
    );
}

#[test]
fn test_calling_a_non_callable_local() {
    assert_eq!(
        eval_err_kind("var f = 3\nf()"),
        EvalErrorKind::NotCallable {
            type_name: "int".into()
        }
    );
}

#[test]
fn test_null_receiver() {
    let err = eval("null.foo()").unwrap_err();
    assert_eq!(err.message, "cannot invoke method foo() on null object");
}

#[test]
fn test_interpreter_mode_collection() {
    let session = Arc::new(Session::new());
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    ctx.begin_collection();
    let source = "var a = 1\nb = 2\na = 3\ndef f() { c = 4 }\nf()\nif (true) { var hidden = 5 }";
    eval_with(&session, ctx.clone(), source).unwrap();
    assert_eq!(
        ctx.take_collected(),
        Some(vec![
            ("a".to_string(), Value::Int(3)),
            ("b".to_string(), Value::Int(2)),
            ("c".to_string(), Value::Int(4)),
        ])
    );
}

#[test]
fn test_interrupt() {
    let session = Arc::new(Session::new());
    let ctx = EvaluationContext::new(session.bindings().clone(), OutputSink::silent());
    let unit = StrandBackend::new()
        .compile("while (true) { }", &Arc::new(core_imports()))
        .unwrap();
    let interrupt = InterruptHandle::new();
    interrupt.interrupt();
    let inv = Invocation::new(ctx, session).with_interrupt(interrupt);
    assert_eq!(unit.run(&inv).unwrap_err().kind, EvalErrorKind::Interrupted);
}
