//! Spreads: countable vs. enumerated expansion, `AddRange` bridging, and the
//! source order of every runtime effect.

mod support;

use csz_checker::{Body, BodyBuilder, BodyId, CollectionElement, Effect, ExprId};
use csz_common::diagnostics::diagnostic_codes;
use csz_solver::db::{MethodDecl, TypeDecl};
use csz_solver::{TypeDatabase, TypeId, TypeStore, WellKnownType};
use support::{analyze, core_store, list_of, printed_plan, well_known};

/// `T v = [x, ..source, y];` with `x` and `y` int locals.
fn around_spread(store: &TypeStore, target: TypeId, source_type: TypeId) -> (Body, ExprId) {
    let mut b = BodyBuilder::new(BodyId(0));
    let x = b.local(store.atom("x"), TypeId::INT);
    let source = b.local(store.atom("source"), source_type);
    let y = b.local(store.atom("y"), TypeId::INT);
    let literal = b.literal(vec![
        CollectionElement::Expr(x),
        CollectionElement::Spread(source),
        CollectionElement::Expr(y),
    ]);
    b.declare(store.atom("v"), Some(target), literal);
    (b.finish(), literal)
}

fn source_order(store: &TypeStore, body: &Body, literal: ExprId) -> Vec<String> {
    let analysis = analyze(store, body);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.codes());
    let plan = analysis
        .facts
        .peek_plan((body.id, literal))
        .expect("plan stored");
    plan.effects()
        .into_iter()
        .filter_map(Effect::source_expr)
        .map(|e| match &body.expr(e).kind {
            csz_checker::ExprKind::Local { name, .. } => store.resolve_atom(*name).to_string(),
            other => format!("{other:?}"),
        })
        .collect()
}

#[test]
fn test_countable_spread_into_array() {
    let store = core_store();
    let (body, literal) =
        around_spread(&store, store.array(TypeId::INT, 1), store.array(TypeId::INT, 1));
    let analysis = analyze(&store, &body);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.codes());
    assert_eq!(
        printed_plan(&store, &analysis, &body, literal),
        "array_init int[] length=2 + source.Length\n\
         \x20 store [0] x (Identity)\n\
         \x20 spread_countable source\n\
         \x20 store [next] y (Identity)\n"
    );
}

#[test]
fn test_enumerable_spread_into_array_is_gathered() {
    let store = core_store();
    let enumerable = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);
    let (body, literal) = around_spread(&store, store.array(TypeId::INT, 1), enumerable);
    let analysis = analyze(&store, &body);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.codes());
    assert_eq!(
        printed_plan(&store, &analysis, &body, literal),
        "array_init int[] length=gathered\n\
         \x20 store [0] x (Identity)\n\
         \x20 spread_enumerate source dispose\n\
         \x20 store [next] y (Identity)\n"
    );
}

#[test]
fn test_list_spread_bridges_to_add_range() {
    let store = core_store();
    let list = list_of(&store, TypeId::INT);
    let enumerable = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);
    let (body, literal) = around_spread(&store, list, enumerable);
    let analysis = analyze(&store, &body);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.codes());
    assert_eq!(
        printed_plan(&store, &analysis, &body, literal),
        "construct_then_add List<int>\n\
         \x20 constructor List<int>.List()\n\
         \x20 add List<int>.Add(int) x (Identity)\n\
         \x20 add_range List<int>.AddRange(IEnumerable<int>) source\n\
         \x20 add List<int>.Add(int) y (Identity)\n"
    );
}

#[test]
fn test_converting_spread_expands_per_element() {
    let store = core_store();
    let list = list_of(&store, TypeId::LONG);
    let (body, literal) = around_spread(&store, list, store.array(TypeId::INT, 1));
    let analysis = analyze(&store, &body);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.codes());
    assert_eq!(
        printed_plan(&store, &analysis, &body, literal),
        "construct_then_add List<long>\n\
         \x20 constructor List<long>.List()\n\
         \x20 add List<long>.Add(long) x (Numeric)\n\
         \x20 spread_countable source via List<long>.Add(long)\n\
         \x20 add List<long>.Add(long) y (Numeric)\n"
    );
}

#[test]
fn test_effects_follow_source_order_for_every_target() {
    let store = core_store();
    let enumerable = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);
    let int_array = store.array(TypeId::INT, 1);
    let targets = [
        int_array,
        list_of(&store, TypeId::INT),
        list_of(&store, TypeId::LONG),
        well_known(&store, WellKnownType::IReadOnlyListT, &[TypeId::INT]),
        well_known(&store, WellKnownType::SpanT, &[TypeId::INT]),
    ];
    for target in targets {
        for source_type in [int_array, enumerable] {
            let (body, literal) = around_spread(&store, target, source_type);
            assert_eq!(
                source_order(&store, &body, literal),
                vec!["x", "source", "y"],
                "{target:?} <- {source_type:?}"
            );
        }
    }
}

#[test]
fn test_spread_of_non_enumerable() {
    let store = core_store();
    let (body, _) = around_spread(&store, store.array(TypeId::INT, 1), TypeId::INT);
    let analysis = analyze(&store, &body);
    assert_eq!(analysis.codes(), vec![diagnostic_codes::FOREACH_CANNOT_OPERATE_ON_TYPE]);
}

#[test]
fn test_spread_with_wrong_iteration_type() {
    let store = core_store();
    let strings = store.array(TypeId::STRING, 1);

    let (body, literal) = around_spread(&store, store.array(TypeId::INT, 1), strings);
    let analysis = analyze(&store, &body);
    assert_eq!(analysis.codes(), vec![diagnostic_codes::CANNOT_IMPLICITLY_CONVERT_TYPE]);
    assert!(analysis.facts.peek_plan((body.id, literal)).is_none());

    let (body, _) = around_spread(&store, list_of(&store, TypeId::INT), strings);
    let analysis = analyze(&store, &body);
    assert_eq!(
        analysis.codes(),
        vec![
            diagnostic_codes::BAD_ARG_TYPES_FOR_COLLECTION_ADD,
            diagnostic_codes::ARGUMENT_CANNOT_CONVERT,
        ]
    );
}

#[test]
fn test_nested_literals_run_effects_in_source_order() {
    let store = core_store();
    let def = store.declare(TypeDecl::class("App", "Chain").type_params(&["T"]).assembly("Main"));
    let t = store.type_params_of(def)[0];
    store.add_interface(def, well_known(&store, WellKnownType::IEnumerableT, &[t]));
    let ctor = store.add_method(def, MethodDecl::constructor());
    let add = store.add_method(def, MethodDecl::new("Add").param("item", t));
    let inner = store.named(def, &[TypeId::INT]);
    let outer = store.named(def, &[inner]);

    // `Chain<Chain<int>> y = [[Get(3)], [Get(4), Get(5)]];`
    let mut b = BodyBuilder::new(BodyId(0));
    let get = |b: &mut BodyBuilder, value: i32| {
        let arg = b.int(value);
        b.call(store.atom("Get"), vec![arg], TypeId::INT)
    };
    let get3 = get(&mut b, 3);
    let first = b.list(&[get3]);
    let get4 = get(&mut b, 4);
    let get5 = get(&mut b, 5);
    let second = b.list(&[get4, get5]);
    let literal = b.list(&[first, second]);
    b.declare(store.atom("y"), Some(outer), literal);
    let body = b.finish();

    let analysis = analyze(&store, &body);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.codes());
    let plan = analysis
        .facts
        .peek_plan((body.id, literal))
        .expect("plan stored");
    assert_eq!(
        plan.effects(),
        vec![
            Effect::Call(ctor),
            Effect::Construct(outer),
            Effect::Call(ctor),
            Effect::Construct(inner),
            Effect::Evaluate(get3),
            Effect::Call(add),
            Effect::Call(add),
            Effect::Call(ctor),
            Effect::Construct(inner),
            Effect::Evaluate(get4),
            Effect::Call(add),
            Effect::Evaluate(get5),
            Effect::Call(add),
            Effect::Call(add),
        ]
    );
    assert!(analysis.facts.peek_plan((body.id, first)).is_none());
    assert!(analysis.facts.peek_plan((body.id, second)).is_none());
}
