use super::*;
use crate::corlib::core_store;
use crate::db::{MethodDecl, TypeDecl, TypeStore};

fn well_known(store: &TypeStore, tag: WellKnownType, args: &[TypeId]) -> TypeId {
    store.well_known_type(tag, args).expect("well-known type installed")
}

#[test]
fn test_numeric_widening_is_implicit_narrowing_is_explicit() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    assert_eq!(c.classify(TypeId::INT, TypeId::LONG), Conversion::Numeric);
    assert_eq!(c.classify(TypeId::CHAR, TypeId::INT), Conversion::Numeric);
    assert_eq!(c.classify(TypeId::LONG, TypeId::INT), Conversion::ExplicitOnly);
    assert_eq!(c.classify(TypeId::DOUBLE, TypeId::FLOAT), Conversion::ExplicitOnly);
    assert_eq!(c.classify(TypeId::BOOL, TypeId::INT), Conversion::NoConversion);
}

#[test]
fn test_constants_narrow_when_in_range() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    assert_eq!(
        c.classify_constant(&ConstantValue::Int(5), TypeId::BYTE),
        Conversion::ImplicitConstant
    );
    assert_eq!(
        c.classify_constant(&ConstantValue::Int(300), TypeId::BYTE),
        Conversion::ExplicitOnly
    );
    assert_eq!(
        c.classify_constant(&ConstantValue::Int(-1), TypeId::ULONG),
        Conversion::ExplicitOnly
    );
    assert_eq!(
        c.classify_constant(&ConstantValue::Int(7), store.nullable(TypeId::SHORT)),
        Conversion::ImplicitNullable
    );
    assert_eq!(
        c.classify_constant(&ConstantValue::Int(7), TypeId::LONG),
        Conversion::Numeric,
        "widening wins over constant narrowing"
    );
}

#[test]
fn test_zero_converts_to_enums() {
    let store = core_store();
    let color = store.declare(TypeDecl::new(crate::def::DefKind::Enum, "App", "Color"));
    let color = store.named(color, &[]);
    let c = ConversionClassifier::new(&store);
    assert_eq!(c.classify_constant(&ConstantValue::Int(0), color), Conversion::ImplicitConstant);
    assert_eq!(c.classify_constant(&ConstantValue::Int(1), color), Conversion::ExplicitOnly);
}

#[test]
fn test_null_literal_targets() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    assert_eq!(c.classify_null(TypeId::STRING), Conversion::NullLiteral);
    assert_eq!(c.classify_null(store.nullable(TypeId::INT)), Conversion::NullLiteral);
    assert_eq!(c.classify_null(TypeId::INT), Conversion::NoConversion);
    assert_eq!(c.classify_constant(&ConstantValue::Null, TypeId::OBJECT), Conversion::NullLiteral);
    assert_eq!(c.classify(TypeId::NULL, TypeId::STRING), Conversion::NullLiteral);
}

#[test]
fn test_boxing_and_reference_conversions() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    let list_int = well_known(&store, WellKnownType::ListT, &[TypeId::INT]);
    let enum_int = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);
    assert_eq!(c.classify(TypeId::INT, TypeId::OBJECT), Conversion::Boxing);
    assert_eq!(c.classify(list_int, enum_int), Conversion::ImplicitReference);
    assert_eq!(c.classify(list_int, TypeId::OBJECT), Conversion::ImplicitReference);
    assert_eq!(c.classify(TypeId::OBJECT, list_int), Conversion::ExplicitOnly);

    let s = store.declare(TypeDecl::structure("App", "Bag"));
    store.add_interface(s, enum_int);
    assert_eq!(c.classify(store.named(s, &[]), enum_int), Conversion::Boxing);
}

#[test]
fn test_covariance_only_for_reference_arguments() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    let list_string = well_known(&store, WellKnownType::ListT, &[TypeId::STRING]);
    let list_int = well_known(&store, WellKnownType::ListT, &[TypeId::INT]);
    let enum_object = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::OBJECT]);
    let ilist_object = well_known(&store, WellKnownType::IListT, &[TypeId::OBJECT]);
    assert_eq!(c.classify(list_string, enum_object), Conversion::ImplicitReference);
    assert_eq!(c.classify(list_int, enum_object), Conversion::ExplicitOnly);
    assert_eq!(
        c.classify(list_string, ilist_object),
        Conversion::ExplicitOnly,
        "IList<T> is invariant"
    );
}

#[test]
fn test_array_covariance() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    let strings = store.array(TypeId::STRING, 1);
    let objects = store.array(TypeId::OBJECT, 1);
    assert_eq!(c.classify(strings, objects), Conversion::ImplicitReference);
    assert_eq!(c.classify(store.array(TypeId::INT, 1), objects), Conversion::NoConversion);
    assert_eq!(c.classify(store.array(TypeId::STRING, 2), objects), Conversion::NoConversion);
    let enum_int = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);
    assert_eq!(
        c.classify(store.array(TypeId::INT, 1), enum_int),
        Conversion::ImplicitReference
    );
}

#[test]
fn test_dynamic_and_object_are_interchangeable() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    assert_eq!(c.classify(TypeId::OBJECT, TypeId::DYNAMIC), Conversion::Identity);
    assert_eq!(c.classify(TypeId::DYNAMIC, TypeId::OBJECT), Conversion::Identity);
    assert_eq!(c.classify(TypeId::DYNAMIC, TypeId::INT), Conversion::ImplicitDynamic);
    assert_eq!(c.classify(TypeId::INT, TypeId::DYNAMIC), Conversion::Boxing);
}

#[test]
fn test_nullable_annotation_is_ignored() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    assert_eq!(
        c.classify(store.nullable_ref(TypeId::STRING), TypeId::STRING),
        Conversion::Identity
    );
    assert_eq!(
        c.classify(TypeId::INT, store.nullable(TypeId::LONG)),
        Conversion::ImplicitNullable
    );
    assert_eq!(
        c.classify(store.nullable(TypeId::INT), TypeId::INT),
        Conversion::ExplicitOnly
    );
}

#[test]
fn test_ref_structs_never_box() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    let span = well_known(&store, WellKnownType::SpanT, &[TypeId::INT]);
    assert_eq!(c.classify(span, TypeId::OBJECT), Conversion::NoConversion);
}

#[test]
fn test_lock_to_other_reference_type_is_flagged() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    let lock = well_known(&store, WellKnownType::Lock, &[]);
    assert_eq!(c.classify(lock, TypeId::OBJECT), Conversion::LockScopeToReference);
    assert_eq!(c.classify(lock, lock), Conversion::Identity);
    assert!(Conversion::LockScopeToReference.is_implicit());
    assert!(!Conversion::LockScopeToReference.is_standard_implicit());
}

#[test]
fn test_custom_scope_check_replaces_lock_identity() {
    let store = core_store();
    let gate = store.declare(TypeDecl::class("App", "Gate"));
    let gate_ty = store.named(gate, &[]);
    let check = move |ty: TypeId| ty == gate_ty;
    let c = ConversionClassifier::new(&store).with_scope_check(&check);
    assert!(c.is_scope_capable(gate_ty));
    assert_eq!(c.classify(gate_ty, TypeId::OBJECT), Conversion::LockScopeToReference);
    let lock = well_known(&store, WellKnownType::Lock, &[]);
    assert_eq!(c.classify(lock, TypeId::OBJECT), Conversion::ImplicitReference);
}

#[test]
fn test_type_parameter_conversions() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    let (_, t) = store.method_type_param("T", 0);
    assert_eq!(c.classify(t, TypeId::OBJECT), Conversion::Boxing);
    assert_eq!(c.classify(TypeId::OBJECT, t), Conversion::ExplicitOnly);
}

#[test]
fn test_better_conversion_target() {
    let store = core_store();
    let c = ConversionClassifier::new(&store);
    assert_eq!(better_conversion_target(&c, TypeId::INT, TypeId::LONG), BetterTarget::First);
    assert_eq!(better_conversion_target(&c, TypeId::DOUBLE, TypeId::FLOAT), BetterTarget::Second);
    assert_eq!(better_conversion_target(&c, TypeId::INT, TypeId::UINT), BetterTarget::First);
    assert_eq!(better_conversion_target(&c, TypeId::STRING, TypeId::INT), BetterTarget::Neither);
}

#[test]
fn test_user_defined_only_when_no_standard_conversion() {
    let store = core_store();
    let meters = store.declare(TypeDecl::structure("App", "Meters"));
    let meters_ty = store.named(meters, &[]);
    let op = store.add_method(meters, MethodDecl::conversion(true, TypeId::INT, meters_ty));
    let c = ConversionClassifier::new(&store);
    assert_eq!(c.classify(TypeId::INT, meters_ty), Conversion::UserDefined(op));
    assert_eq!(c.standard(TypeId::INT, meters_ty), Conversion::NoConversion);
    assert!(!Conversion::UserDefined(op).is_standard_implicit());
}

