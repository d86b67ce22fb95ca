use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_locals() {
    let ctx = EvaluationContext::detached().with_local("x", Value::Int(1));
    assert_eq!(ctx.local("x"), Some(Value::Int(1)));
    assert!(!ctx.has_local("y"));
    ctx.set_local("y", Value::Int(2));
    assert_eq!(ctx.local_names(), vec!["x".to_string(), "y".to_string()]);
    assert_eq!(ctx.remove_local("x"), Some(Value::Int(1)));
    assert!(!ctx.has_local("x"));
}

#[test]
fn test_staged_writes_invisible_to_session_until_commit() {
    let session = SessionBindings::new();
    session.set("n", Value::Int(1));
    let ctx = EvaluationContext::new(session.clone(), OutputSink::silent());

    ctx.stage_session_write("n", Value::Int(2));
    assert_eq!(ctx.session_value("n"), Some(Value::Int(2)));
    assert_eq!(session.get("n"), Some(Value::Int(1)));

    ctx.commit();
    assert_eq!(session.get("n"), Some(Value::Int(2)));
}

#[test]
fn test_discard_staged() {
    let session = SessionBindings::new();
    let ctx = EvaluationContext::new(session.clone(), OutputSink::silent());
    ctx.stage_session_write("n", Value::Int(2));
    assert!(ctx.has_session_value("n"));
    ctx.discard_staged();
    ctx.commit();
    assert!(session.is_empty());
}

#[test]
fn test_collection_slot_lifecycle() {
    let ctx = EvaluationContext::detached();
    ctx.collect_local("ignored", Value::Int(0));
    assert!(!ctx.is_collecting());

    ctx.begin_collection();
    ctx.collect_local("a", Value::Int(1));
    ctx.collect_local("b", Value::Int(2));
    ctx.collect_local("a", Value::Int(3));

    assert_eq!(
        ctx.take_collected(),
        Some(vec![
            ("a".to_string(), Value::Int(3)),
            ("b".to_string(), Value::Int(2)),
        ])
    );
    assert!(!ctx.is_collecting());
    assert_eq!(ctx.take_collected(), None);
}

#[test]
fn test_context_ref_does_not_keep_call_alive() {
    let ctx = EvaluationContext::detached();
    let handle = ctx.downgrade();
    assert!(handle.upgrade().is_some_and(|c| c.ptr_eq(&ctx)));
    drop(ctx);
    assert!(handle.upgrade().is_none());
}
