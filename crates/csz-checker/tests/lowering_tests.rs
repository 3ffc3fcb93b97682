use super::*;
use crate::lowering::printer::PlanPrinter;
use csz_common::span::Span;
use csz_solver::well_known::lookup_member;
use csz_solver::{TypeStore, WellKnownMember, WellKnownType, core_store};

fn element(order: u32, element_type: TypeId, kind: BoundElementKind) -> BoundElement {
    BoundElement {
        order,
        span: Span::new(order * 10, order * 10 + 5),
        element_type,
        conversion: Conversion::Identity,
        kind,
    }
}

fn constant(order: u32, element_type: TypeId, value: ConstantValue) -> BoundElement {
    element(
        order,
        element_type,
        BoundElementKind::Expr {
            value: BoundValue::Constant(value),
            adder: None,
        },
    )
}

fn spread(order: u32, element_type: TypeId, source: u32, spread: SpreadKind) -> BoundElement {
    element(
        order,
        element_type,
        BoundElementKind::Spread {
            source: ExprId(source),
            source_type: TypeId::ERROR,
            iteration_type: element_type,
            spread,
            enumerator: None,
            adder: None,
            bulk_compatible: false,
        },
    )
}

fn array_of(store: &TypeStore, element: TypeId, elements: Vec<BoundElement>) -> BoundCollection {
    let array_type = store.array(element, 1);
    BoundCollection {
        node: ExprId(0),
        span: Span::default(),
        target: array_type,
        verdict: None,
        strategy: CollectionStrategy::Array {
            array_type,
            element,
        },
        elements,
    }
}

fn span_of(store: &TypeStore, readonly: bool, elements: Vec<BoundElement>) -> BoundCollection {
    let (tag, member) = if readonly {
        (WellKnownType::ReadOnlySpanT, WellKnownMember::ReadOnlySpanCtorArray)
    } else {
        (WellKnownType::SpanT, WellKnownMember::SpanCtorArray)
    };
    let span_type = store.well_known_type(tag, &[TypeId::INT]).expect("span installed");
    let id = lookup_member(store, member).expect("span constructor");
    let constructor = ResolvedMethod::new(store, id, span_type, 0).expect("resolved constructor");
    BoundCollection {
        node: ExprId(0),
        span: Span::default(),
        target: span_type,
        verdict: None,
        strategy: CollectionStrategy::Span {
            span_type,
            element: TypeId::INT,
            readonly,
            constructor,
        },
        elements,
    }
}

#[test]
fn test_constant_int_array_packs_into_blob() {
    let store = core_store();
    let bound = array_of(
        &store,
        TypeId::INT,
        vec![
            constant(0, TypeId::INT, ConstantValue::Int(1)),
            constant(1, TypeId::INT, ConstantValue::Int(258)),
        ],
    );
    let plan = LoweringPlanner::new(&store).plan(&bound);
    assert_eq!(
        plan,
        LoweringPlan::ArrayInit {
            array_type: store.array(TypeId::INT, 1),
            element_type: TypeId::INT,
            length: ArrayLength::Fixed(2),
            initializer: ArrayInitializer::MetadataBlob {
                bytes: vec![1, 0, 0, 0, 2, 1, 0, 0],
            },
        }
    );
}

#[test]
fn test_string_array_stores_each_element() {
    let store = core_store();
    let bound = array_of(
        &store,
        TypeId::STRING,
        vec![
            constant(0, TypeId::STRING, ConstantValue::String("a".into())),
            constant(1, TypeId::STRING, ConstantValue::String("b".into())),
        ],
    );
    let LoweringPlan::ArrayInit {
        length,
        initializer: ArrayInitializer::ElementStores(steps),
        ..
    } = LoweringPlanner::new(&store).plan(&bound)
    else {
        panic!("expected element stores");
    };
    assert_eq!(length, ArrayLength::Fixed(2));
    let indices: Vec<_> = steps
        .iter()
        .map(|step| match step {
            LoweringStep::Store { index, .. } => *index,
            other => panic!("unexpected step {other:?}"),
        })
        .collect();
    assert_eq!(indices, vec![Some(0), Some(1)]);
}

#[test]
fn test_empty_array_uses_empty_form() {
    let store = core_store();
    let plan = LoweringPlanner::new(&store).plan(&array_of(&store, TypeId::INT, Vec::new()));
    assert!(matches!(
        plan,
        LoweringPlan::ArrayInit {
            length: ArrayLength::Fixed(0),
            initializer: ArrayInitializer::Empty,
            ..
        }
    ));
}

#[test]
fn test_countable_spread_computes_length() {
    let store = core_store();
    let bound = array_of(
        &store,
        TypeId::INT,
        vec![
            spread(0, TypeId::INT, 7, SpreadKind::Countable),
            constant(1, TypeId::INT, ConstantValue::Int(3)),
        ],
    );
    let LoweringPlan::ArrayInit {
        length,
        initializer: ArrayInitializer::ElementStores(steps),
        ..
    } = LoweringPlanner::new(&store).plan(&bound)
    else {
        panic!("expected element stores");
    };
    assert_eq!(
        length,
        ArrayLength::Computed {
            fixed: 1,
            spreads: vec![ExprId(7)],
        }
    );
    assert!(matches!(steps[1], LoweringStep::Store { index: None, .. }));
}

#[test]
fn test_enumerable_spread_gathers() {
    let store = core_store();
    let bound = array_of(
        &store,
        TypeId::INT,
        vec![
            constant(0, TypeId::INT, ConstantValue::Int(3)),
            spread(1, TypeId::INT, 7, SpreadKind::GeneralEnumerable),
            spread(2, TypeId::INT, 8, SpreadKind::Countable),
        ],
    );
    let plan = LoweringPlanner::new(&store).plan(&bound);
    assert!(matches!(
        plan,
        LoweringPlan::ArrayInit {
            length: ArrayLength::Gathered,
            ..
        }
    ));
}

#[test]
fn test_readonly_span_of_constants_reads_blob_directly() {
    let store = core_store();
    let bound = span_of(
        &store,
        true,
        vec![
            constant(0, TypeId::INT, ConstantValue::Int(1)),
            constant(1, TypeId::INT, ConstantValue::Int(2)),
        ],
    );
    let plan = LoweringPlanner::new(&store).plan(&bound);
    assert!(matches!(
        plan,
        LoweringPlan::SpanWrap {
            readonly: true,
            constructor: None,
            backing: SpanBacking::MetadataBlob { .. },
            ..
        }
    ));
}

#[test]
fn test_mutable_span_wraps_array() {
    let store = core_store();
    let bound = span_of(
        &store,
        false,
        vec![constant(0, TypeId::INT, ConstantValue::Int(1))],
    );
    let LoweringPlan::SpanWrap {
        constructor,
        backing: SpanBacking::Array(backing),
        ..
    } = LoweringPlanner::new(&store).plan(&bound)
    else {
        panic!("expected array backing");
    };
    assert!(constructor.is_some());
    assert!(matches!(
        *backing,
        LoweringPlan::ArrayInit {
            initializer: ArrayInitializer::MetadataBlob { .. },
            ..
        }
    ));
}

#[test]
fn test_bulk_spread_uses_add_range() {
    let store = core_store();
    let list = store
        .well_known_type(WellKnownType::ListT, &[TypeId::INT])
        .expect("List<T> installed");
    let add_range_id = lookup_member(&store, WellKnownMember::ListAddRange).expect("AddRange");
    let add_range = ResolvedMethod::new(&store, add_range_id, list, 0).expect("resolved AddRange");
    let mut bulk = spread(0, TypeId::INT, 5, SpreadKind::GeneralEnumerable);
    if let BoundElementKind::Spread {
        bulk_compatible, ..
    } = &mut bulk.kind
    {
        *bulk_compatible = true;
    }
    let bound = BoundCollection {
        node: ExprId(0),
        span: Span::default(),
        target: list,
        verdict: None,
        strategy: CollectionStrategy::Construct {
            collection_type: list,
            constructor: None,
            constructor_args: Vec::new(),
            add_range: Some(add_range.clone()),
        },
        elements: vec![bulk],
    };
    let LoweringPlan::ConstructThenAdd { steps, .. } = LoweringPlanner::new(&store).plan(&bound)
    else {
        panic!("expected construct-then-add");
    };
    assert_eq!(
        steps.as_slice(),
        &[LoweringStep::AddRange {
            method: add_range,
            source: ExprId(5),
        }]
    );
}

#[test]
fn test_effects_follow_element_order() {
    let store = core_store();
    let bound = array_of(
        &store,
        TypeId::INT,
        vec![
            element(
                0,
                TypeId::INT,
                BoundElementKind::Expr {
                    value: BoundValue::Expr(ExprId(3)),
                    adder: None,
                },
            ),
            spread(1, TypeId::INT, 4, SpreadKind::Countable),
            element(
                2,
                TypeId::INT,
                BoundElementKind::Expr {
                    value: BoundValue::Expr(ExprId(5)),
                    adder: None,
                },
            ),
        ],
    );
    let sources: Vec<ExprId> = LoweringPlanner::new(&store)
        .plan(&bound)
        .effects()
        .into_iter()
        .filter_map(Effect::source_expr)
        .collect();
    assert_eq!(sources, vec![ExprId(3), ExprId(4), ExprId(5)]);
}

#[test]
fn test_printer_renders_blob() {
    let store = core_store();
    let bound = array_of(
        &store,
        TypeId::BYTE,
        vec![
            constant(0, TypeId::BYTE, ConstantValue::Int(1)),
            constant(1, TypeId::BYTE, ConstantValue::Int(255)),
        ],
    );
    let plan = LoweringPlanner::new(&store).plan(&bound);
    assert_eq!(
        PlanPrinter::new(&store).print(&plan),
        "array_init byte[] length=2\n  blob 01ff\n"
    );
}
