use super::*;
use csz_common::interner::Atom;

#[test]
fn test_builder_assigns_distinct_spans() {
    let mut b = BodyBuilder::new(BodyId(0));
    let one = b.int(1);
    let two = b.int(2);
    let body = b.finish();
    assert_ne!(body.expr(one).span, body.expr(two).span);
    assert_eq!(body.expr_count(), 2);
}

#[test]
fn test_explicit_span_applies_to_next_node_only() {
    let mut b = BodyBuilder::new(BodyId(0));
    b.at(Span::new(100, 107));
    let first = b.int(1);
    let second = b.int(2);
    let body = b.finish();
    assert_eq!(body.expr(first).span, Span::new(100, 107));
    assert_ne!(body.expr(second).span, Span::new(100, 107));
}

#[test]
fn test_nested_statements_are_not_top_level() {
    let mut b = BodyBuilder::new(BodyId(3));
    let value = b.int(1);
    let inner = b.nested(StmtKind::Expr(value));
    let resource = b.local(Atom(1), TypeId::OBJECT);
    let lock = b.lock(resource, vec![inner]);
    let body = b.finish();
    assert_eq!(body.statements(), &[lock]);
    assert!(matches!(body.stmt(inner).kind, StmtKind::Expr(_)));
}

#[test]
fn test_collection_element_accessors() {
    let e = ExprId(4);
    assert_eq!(CollectionElement::Expr(e).expr(), e);
    assert_eq!(CollectionElement::Spread(e).expr(), e);
    assert!(CollectionElement::Spread(e).is_spread());
    assert!(!CollectionElement::Expr(e).is_spread());
}

#[test]
fn test_is_collection_literal() {
    let mut b = BodyBuilder::new(BodyId(0));
    let one = b.int(1);
    let literal = b.list(&[one]);
    let body = b.finish();
    assert!(body.is_collection_literal(literal));
    assert!(!body.is_collection_literal(one));
    assert!(body.get_expr(ExprId(99)).is_none());
}

#[test]
fn test_await_inside_lambda_does_not_suspend_body() {
    let mut b = BodyBuilder::new(BodyId(0));
    let task = b.local(Atom(1), TypeId::OBJECT);
    let awaited = b.await_expr(task);
    let lambda = b.lambda(awaited, None, false);
    let stmt = b.nested(StmtKind::Expr(lambda));
    let body = b.finish();
    assert!(!body.contains_suspension(&[stmt]));
}

#[test]
fn test_suspensions_in_source_order() {
    let mut b = BodyBuilder::new(BodyId(0));
    let task = b.local(Atom(1), TypeId::OBJECT);
    let awaited = b.await_expr(task);
    let first = b.nested(StmtKind::Expr(awaited));
    let value = b.int(1);
    let second = b.nested(StmtKind::YieldReturn(value));
    let body = b.finish();
    assert_eq!(
        body.suspensions(&[first, second]),
        vec![Suspension::Await(awaited), Suspension::Yield(second)]
    );
    assert_eq!(body.first_await(&[second, first]), Some(awaited));
    assert_eq!(body.first_await(&[second]), None);
    assert!(body.contains_suspension(&[second]));
}

#[test]
fn test_await_in_literal_element_suspends() {
    let mut b = BodyBuilder::new(BodyId(0));
    let task = b.local(Atom(1), TypeId::INT);
    let awaited = b.await_expr(task);
    let literal = b.literal(vec![CollectionElement::Spread(awaited)]);
    let stmt = b.nested(StmtKind::Expr(literal));
    let body = b.finish();
    assert_eq!(body.first_await(&[stmt]), Some(awaited));
}
