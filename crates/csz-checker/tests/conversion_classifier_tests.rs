//! Expression-level conversions: literals, constants, `null`, and the
//! would-be natural type used to exclude user-defined conversions.

mod support;

use csz_checker::conversion_classifier::{classify_expr_conversion, would_be_natural_type};
use csz_checker::{Body, BodyBuilder, BodyId, CheckerContext, CollectionElement, ExprId};
use csz_common::diagnostics::diagnostic_codes;
use csz_common::options::AnalysisOptions;
use csz_solver::db::{MethodDecl, TypeDecl};
use csz_solver::diagnostics::DiagnosticArg;
use csz_solver::{
    AccessContext, BestMatchResolver, Conversion, SolverCaches, TypeDatabase, TypeId, TypeStore,
    WellKnownType,
};
use support::{list_of, well_known};

fn classify(store: &TypeStore, body: &Body, expr: ExprId, target: TypeId) -> Conversion {
    let caches = SolverCaches::new();
    let options = AnalysisOptions::default();
    let resolver = BestMatchResolver;
    let ctx = CheckerContext::new(
        store,
        &caches,
        &options,
        &resolver,
        AccessContext::new(None, store.atom("Main")),
    );
    classify_expr_conversion(&ctx, body, expr, target)
}

fn natural(store: &TypeStore, body: &Body, elements: &[CollectionElement]) -> Option<TypeId> {
    let caches = SolverCaches::new();
    let options = AnalysisOptions::default();
    let resolver = BestMatchResolver;
    let ctx = CheckerContext::new(
        store,
        &caches,
        &options,
        &resolver,
        AccessContext::new(None, store.atom("Main")),
    );
    would_be_natural_type(&ctx, body, elements)
}

#[test]
fn test_literal_converts_through_verdict() {
    let store = support::core_store();
    let mut b = BodyBuilder::new(BodyId(0));
    let one = b.int(1);
    let two = b.int(2);
    let literal = b.list(&[one, two]);
    let body = b.finish();

    assert_eq!(
        classify(&store, &body, literal, store.array(TypeId::INT, 1)),
        Conversion::CollectionLiteral
    );
    assert_eq!(
        classify(&store, &body, literal, list_of(&store, TypeId::LONG)),
        Conversion::CollectionLiteral
    );
    assert_eq!(
        classify(
            &store,
            &body,
            literal,
            well_known(&store, WellKnownType::IEnumerableT, &[TypeId::BYTE])
        ),
        Conversion::CollectionLiteral
    );
    assert_eq!(
        classify(&store, &body, literal, store.array(TypeId::STRING, 1)),
        Conversion::NoConversion
    );
    assert_eq!(classify(&store, &body, literal, TypeId::OBJECT), Conversion::NoConversion);
    assert_eq!(classify(&store, &body, literal, TypeId::ERROR), Conversion::Identity);
}

#[test]
fn test_nested_literal_conversion() {
    let store = support::core_store();
    let mut b = BodyBuilder::new(BodyId(0));
    let one = b.int(1);
    let inner = b.list(&[one]);
    let outer = b.literal(vec![CollectionElement::Expr(inner)]);
    let body = b.finish();

    let jagged = store.array(store.array(TypeId::INT, 1), 1);
    assert_eq!(classify(&store, &body, outer, jagged), Conversion::CollectionLiteral);
    let flat = store.array(TypeId::INT, 1);
    assert_eq!(classify(&store, &body, outer, flat), Conversion::NoConversion);
}

#[test]
fn test_spread_conversion_uses_iteration_type() {
    let store = support::core_store();
    let mut b = BodyBuilder::new(BodyId(0));
    let source = b.local(store.atom("xs"), list_of(&store, TypeId::INT));
    let literal = b.literal(vec![CollectionElement::Spread(source)]);
    let body = b.finish();

    assert_eq!(
        classify(&store, &body, literal, store.array(TypeId::LONG, 1)),
        Conversion::CollectionLiteral
    );
    assert_eq!(
        classify(&store, &body, literal, store.array(TypeId::STRING, 1)),
        Conversion::NoConversion
    );
}

#[test]
fn test_user_defined_conversion_is_excluded() {
    let store = support::core_store();
    let def = store.declare(TypeDecl::class("App", "Wrapper").assembly("Main"));
    let wrapper = store.named(def, &[]);
    store.add_method(
        def,
        MethodDecl::conversion(true, store.array(TypeId::INT, 1), wrapper),
    );

    let mut b = BodyBuilder::new(BodyId(0));
    let one = b.int(1);
    let ints = b.list(&[one]);
    let text = b.string("s");
    let strings = b.list(&[text]);
    let body = b.finish();

    assert_eq!(classify(&store, &body, ints, wrapper), Conversion::UserDefinedExcluded);
    assert_eq!(classify(&store, &body, strings, wrapper), Conversion::NoConversion);
}

#[test]
fn test_constants_and_null() {
    let store = support::core_store();
    let mut b = BodyBuilder::new(BodyId(0));
    let small = b.int(5);
    let large = b.int(300);
    let null = b.null();
    let body = b.finish();

    assert_eq!(classify(&store, &body, small, TypeId::BYTE), Conversion::ImplicitConstant);
    assert!(!classify(&store, &body, large, TypeId::BYTE).is_implicit());
    assert_eq!(classify(&store, &body, small, TypeId::LONG), Conversion::Numeric);
    assert_eq!(classify(&store, &body, null, TypeId::STRING), Conversion::NullLiteral);
    assert!(!classify(&store, &body, null, TypeId::INT).is_implicit());
}

#[test]
fn test_would_be_natural_type() {
    let store = support::core_store();
    let mut b = BodyBuilder::new(BodyId(0));
    let one = b.int(1);
    let two = b.int(2);
    let text = b.string("s");
    let null = b.null();
    let source = b.local(store.atom("xs"), store.array(TypeId::INT, 1));
    let body = b.finish();

    let int_array = store.array(TypeId::INT, 1);
    assert_eq!(
        natural(
            &store,
            &body,
            &[CollectionElement::Expr(one), CollectionElement::Expr(two)]
        ),
        Some(int_array)
    );
    assert_eq!(
        natural(
            &store,
            &body,
            &[CollectionElement::Expr(one), CollectionElement::Spread(source)]
        ),
        Some(int_array)
    );
    assert_eq!(
        natural(
            &store,
            &body,
            &[CollectionElement::Expr(one), CollectionElement::Expr(text)]
        ),
        None
    );
    assert_eq!(natural(&store, &body, &[CollectionElement::Expr(null)]), None);
    assert_eq!(natural(&store, &body, &[]), None);
}

#[test]
fn test_cast_without_any_conversion_is_an_error() {
    let store = support::core_store();
    let mut b = BodyBuilder::new(BodyId(0));
    let wide = b.local(store.atom("wide"), TypeId::LONG);
    let narrowed = b.cast(TypeId::INT, wide);
    b.expr_stmt(narrowed);
    let boxed = b.local(store.atom("boxed"), TypeId::OBJECT);
    let unboxed = b.cast(list_of(&store, TypeId::INT), boxed);
    b.expr_stmt(unboxed);
    let text = b.local(store.atom("text"), TypeId::STRING);
    let bad = b.cast(TypeId::INT, text);
    b.expr_stmt(bad);
    let body = b.finish();

    let analysis = support::analyze(&store, &body);
    assert_eq!(analysis.codes(), vec![diagnostic_codes::CANNOT_CONVERT_TYPE]);
    assert_eq!(
        analysis.diagnostics[0].args,
        vec![DiagnosticArg::Type(TypeId::STRING), DiagnosticArg::Type(TypeId::INT)]
    );
    assert_eq!(
        analysis.facts.conversion((body.id, wide)),
        Some(Conversion::ExplicitOnly)
    );
    assert_eq!(
        analysis.facts.conversion((body.id, text)),
        Some(Conversion::NoConversion)
    );
}
