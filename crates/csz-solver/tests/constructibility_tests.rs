use super::*;
use crate::class_hierarchy::AccessContext;
use crate::corlib::{CoreLibraryBuilder, core_store};
use crate::db::{MethodDecl, PropertyDecl, TypeDecl, TypeStore};
use crate::types::{Accessibility, MethodFlags, TypeParamConstraints};
use csz_common::options::AnalysisOptions;

fn classify(store: &TypeStore, target: TypeId) -> ConstructibilityVerdict {
    let caches = SolverCaches::new();
    let options = AnalysisOptions::default();
    let locator = ShapeLocator::new(
        store,
        &caches,
        AccessContext::new(None, store.atom("Main")),
        &options,
    );
    ConstructibilityClassifier::new(&locator).classify(target)
}

fn reason(store: &TypeStore, target: TypeId) -> Option<NotConstructibleReason> {
    classify(store, target).reason()
}

fn well_known(store: &TypeStore, tag: WellKnownType, args: &[TypeId]) -> TypeId {
    store.well_known_type(tag, args).expect("well-known type installed")
}

/// `class name : IEnumerable<int>` with an `Add(int)`.
fn int_collection(store: &TypeStore, decl: TypeDecl) -> DefId {
    let def = store.declare(decl.assembly("Main"));
    store.add_interface(def, well_known(store, WellKnownType::IEnumerableT, &[TypeId::INT]));
    store.add_method(def, MethodDecl::new("Add").param("item", TypeId::INT));
    def
}

#[test]
fn test_arrays() {
    let store = core_store();
    assert_eq!(
        classify(&store, store.array(TypeId::STRING, 1)),
        ConstructibilityVerdict::Array {
            element: TypeId::STRING,
            rank: 1
        }
    );
    assert_eq!(
        reason(&store, store.array(TypeId::INT, 2)),
        Some(NotConstructibleReason::RestrictedType)
    );
}

#[test]
fn test_restricted_types() {
    let store = core_store();
    for ty in [
        TypeId::INT,
        TypeId::STRING,
        TypeId::OBJECT,
        store.pointer(TypeId::BYTE),
        store.nullable(TypeId::INT),
    ] {
        assert_eq!(
            reason(&store, ty),
            Some(NotConstructibleReason::RestrictedType),
            "{ty:?}"
        );
    }
}

#[test]
fn test_spans() {
    let store = core_store();
    let span = well_known(&store, WellKnownType::SpanT, &[TypeId::INT]);
    match classify(&store, span) {
        ConstructibilityVerdict::Span {
            element,
            readonly,
            constructor,
            ..
        } => {
            assert_eq!(element, TypeId::INT);
            assert!(!readonly);
            assert_eq!(constructor.params[0].ty, store.array(TypeId::INT, 1));
        }
        other => panic!("expected span verdict, got {other:?}"),
    }

    let ro = well_known(&store, WellKnownType::ReadOnlySpanT, &[TypeId::CHAR]);
    assert!(matches!(
        classify(&store, ro),
        ConstructibilityVerdict::Span { readonly: true, .. }
    ));
}

#[test]
fn test_span_without_array_constructor() {
    let store = TypeStore::new();
    CoreLibraryBuilder::new()
        .without_member(WellKnownMember::SpanCtorArray)
        .install(&store);
    let span = well_known(&store, WellKnownType::SpanT, &[TypeId::INT]);
    assert_eq!(
        reason(&store, span),
        Some(NotConstructibleReason::MissingWellKnownMember(
            WellKnownMember::SpanCtorArray
        ))
    );
}

#[test]
fn test_interfaces_are_backed_by_list() {
    let store = core_store();
    for tag in [
        WellKnownType::IEnumerableT,
        WellKnownType::IReadOnlyCollectionT,
        WellKnownType::IReadOnlyListT,
        WellKnownType::ICollectionT,
        WellKnownType::IListT,
    ] {
        let target = well_known(&store, tag, &[TypeId::INT]);
        match classify(&store, target) {
            ConstructibilityVerdict::InterfaceBackedByDefault {
                interface,
                element,
                concrete,
                adders,
                ..
            } => {
                assert_eq!(interface, target);
                assert_eq!(element, TypeId::INT);
                assert_eq!(concrete, well_known(&store, WellKnownType::ListT, &[TypeId::INT]));
                assert_eq!(adders.len(), 1);
                assert_eq!(adders[0].params[0].ty, TypeId::INT);
            }
            other => panic!("{tag:?}: expected interface-backed verdict, got {other:?}"),
        }
    }

    let legacy = well_known(&store, WellKnownType::IList, &[]);
    assert_eq!(classify(&store, legacy).element_type(), Some(TypeId::OBJECT));
}

#[test]
fn test_interface_without_list_type() {
    let store = TypeStore::new();
    CoreLibraryBuilder::new().without(WellKnownType::ListT).install(&store);
    let target = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);
    assert_eq!(
        reason(&store, target),
        Some(NotConstructibleReason::MissingDefaultType(WellKnownType::ListT))
    );
}

#[test]
fn test_list_is_a_user_defined_collection() {
    let store = core_store();
    let list = well_known(&store, WellKnownType::ListT, &[TypeId::STRING]);
    match classify(&store, list) {
        ConstructibilityVerdict::UserDefinedCollection {
            concrete,
            element,
            constructor,
            adders,
        } => {
            assert_eq!(concrete, list);
            assert_eq!(element, TypeId::STRING);
            let constructor = constructor.expect("List<T>() is declared");
            assert!(constructor.params.is_empty());
            assert_eq!(adders.len(), 1);
        }
        other => panic!("expected user-defined verdict, got {other:?}"),
    }
}

#[test]
fn test_enumerable_without_add_still_constructible() {
    let store = core_store();
    let def = store.declare(TypeDecl::class("App", "ReadOnlyBag"));
    store.add_interface(def, well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]));
    let verdict = classify(&store, store.named(def, &[]));
    assert!(verdict.is_constructible());
    assert_eq!(verdict.adders().map(|a| a.len()), Some(0));
}

#[test]
fn test_requires_enumerable_marker() {
    let store = core_store();
    let def = store.declare(TypeDecl::class("App", "Plain"));
    store.add_method(def, MethodDecl::new("Add").param("item", TypeId::INT));
    assert_eq!(
        reason(&store, store.named(def, &[])),
        Some(NotConstructibleReason::NoEnumerablePattern)
    );
}

#[test]
fn test_abstract_interface_and_enum_targets() {
    let store = core_store();
    let abs = int_collection(&store, TypeDecl::class("App", "Base").flags(DefFlags::ABSTRACT));
    assert_eq!(
        reason(&store, store.named(abs, &[])),
        Some(NotConstructibleReason::Abstract)
    );

    let iface = store.declare(TypeDecl::interface("App", "IBag"));
    store.add_interface(iface, well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]));
    assert_eq!(
        reason(&store, store.named(iface, &[])),
        Some(NotConstructibleReason::Abstract)
    );

    let color = store.declare(TypeDecl::new(DefKind::Enum, "App", "Color"));
    assert_eq!(
        reason(&store, store.named(color, &[])),
        Some(NotConstructibleReason::RestrictedType)
    );
}

#[test]
fn test_constructor_requirements() {
    let store = core_store();

    let sized = int_collection(&store, TypeDecl::class("App", "Sized"));
    store.add_method(sized, MethodDecl::constructor().param("capacity", TypeId::INT));
    assert_eq!(
        reason(&store, store.named(sized, &[])),
        Some(NotConstructibleReason::NoParameterlessConstructor)
    );

    let hidden = int_collection(&store, TypeDecl::class("App", "Hidden"));
    store.add_method(
        hidden,
        MethodDecl::constructor().accessibility(Accessibility::Private),
    );
    assert_eq!(
        reason(&store, store.named(hidden, &[])),
        Some(NotConstructibleReason::Inaccessible)
    );

    let defaulted = int_collection(&store, TypeDecl::class("App", "Defaulted"));
    store.add_method(defaulted, MethodDecl::constructor().param("capacity", TypeId::INT));
    let optional = store.add_method(
        defaulted,
        MethodDecl::constructor().optional_param("capacity", TypeId::LONG),
    );
    match classify(&store, store.named(defaulted, &[])) {
        ConstructibilityVerdict::UserDefinedCollection { constructor, .. } => {
            assert_eq!(constructor.map(|c| c.id), Some(optional));
        }
        other => panic!("expected user-defined verdict, got {other:?}"),
    }

    let implicit = int_collection(&store, TypeDecl::class("App", "Implicit"));
    match classify(&store, store.named(implicit, &[])) {
        ConstructibilityVerdict::UserDefinedCollection { constructor, .. } => {
            assert!(constructor.is_none());
        }
        other => panic!("expected user-defined verdict, got {other:?}"),
    }

    let value = int_collection(&store, TypeDecl::structure("App", "ValueBag"));
    store.add_method(
        value,
        MethodDecl::constructor().accessibility(Accessibility::Private),
    );
    match classify(&store, store.named(value, &[])) {
        ConstructibilityVerdict::UserDefinedCollection { constructor, .. } => {
            assert!(constructor.is_none());
        }
        other => panic!("expected user-defined verdict, got {other:?}"),
    }
}

#[test]
fn test_type_parameter_targets() {
    let store = core_store();
    let enumerable = well_known(&store, WellKnownType::IEnumerableT, &[TypeId::INT]);

    let (_, creatable) = store.method_type_param("TCollection", 0);
    store.set_constraints(
        creatable,
        TypeParamConstraints {
            constructor: true,
            types: vec![enumerable],
            ..Default::default()
        },
    );
    match classify(&store, creatable) {
        ConstructibilityVerdict::UserDefinedCollection {
            element,
            constructor,
            ..
        } => {
            assert_eq!(element, TypeId::INT);
            assert!(constructor.is_none());
        }
        other => panic!("expected user-defined verdict, got {other:?}"),
    }

    let (_, bare) = store.method_type_param("TOther", 1);
    store.set_constraints(
        bare,
        TypeParamConstraints {
            types: vec![enumerable],
            ..Default::default()
        },
    );
    assert_eq!(
        reason(&store, bare),
        Some(NotConstructibleReason::NoParameterlessConstructor)
    );
}

#[test]
fn test_verdicts_are_cached() {
    let store = core_store();
    let caches = SolverCaches::new();
    let options = AnalysisOptions::default();
    let locator = ShapeLocator::new(
        &store,
        &caches,
        AccessContext::new(None, store.atom("Main")),
        &options,
    );
    let classifier = ConstructibilityClassifier::new(&locator);
    let list = well_known(&store, WellKnownType::ListT, &[TypeId::INT]);
    let first = classifier.classify(list);
    let second = classifier.classify(store.nullable_ref(list));
    assert_eq!(first, second);
    assert_eq!(caches.stats().verdicts, 1);
}

#[test]
fn test_validate_params_collection() {
    let store = core_store();
    let caches = SolverCaches::new();
    let options = AnalysisOptions::default();
    let locator = ShapeLocator::new(
        &store,
        &caches,
        AccessContext::new(None, store.atom("Main")),
        &options,
    );
    let classifier = ConstructibilityClassifier::new(&locator);

    assert_eq!(
        classifier.validate_params_collection(store.array(TypeId::LONG, 1)),
        Ok(TypeId::LONG)
    );
    let readonly = well_known(&store, WellKnownType::IReadOnlyListT, &[TypeId::STRING]);
    assert_eq!(classifier.validate_params_collection(readonly), Ok(TypeId::STRING));
    assert_eq!(
        classifier.validate_params_collection(TypeId::INT),
        Err(NotConstructibleReason::RestrictedType)
    );
}

/// `static class name` holding `Create` overloads.
fn builder_class(store: &TypeStore, name: &str) -> DefId {
    store.declare(
        TypeDecl::class("App", name)
            .flags(DefFlags::STATIC | DefFlags::ABSTRACT | DefFlags::SEALED)
            .assembly("Main"),
    )
}

#[test]
fn test_collection_builder_picks_span_only_create() {
    let store = core_store();
    let set = int_collection(&store, TypeDecl::class("App", "MyHashSet"));
    let builder = builder_class(&store, "MyHashSetBuilder");
    store.set_collection_builder(set, builder, "Create");
    let target = store.named(set, &[]);
    let span = well_known(&store, WellKnownType::ReadOnlySpanT, &[TypeId::INT]);

    let create = store.add_method(
        builder,
        MethodDecl::new("Create")
            .param("items", span)
            .returns(target)
            .flags(MethodFlags::STATIC),
    );
    let with_capacity = store.add_method(
        builder,
        MethodDecl::new("Create")
            .param("capacity", TypeId::INT)
            .param("items", span)
            .returns(target)
            .flags(MethodFlags::STATIC),
    );
    // Neither an instance method nor a span of another element qualifies.
    store.add_method(builder, MethodDecl::new("Create").param("items", span).returns(target));
    store.add_method(
        builder,
        MethodDecl::new("Create")
            .param("items", well_known(&store, WellKnownType::ReadOnlySpanT, &[TypeId::LONG]))
            .returns(target)
            .flags(MethodFlags::STATIC),
    );

    match classify(&store, target) {
        ConstructibilityVerdict::CollectionBuilder {
            concrete,
            element,
            span_type,
            create: Some(chosen),
            overloads,
            ..
        } => {
            assert_eq!(concrete, target);
            assert_eq!(element, TypeId::INT);
            assert_eq!(span_type, span);
            assert_eq!(chosen.id, create);
            let ids: Vec<_> = overloads.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![create, with_capacity]);
        }
        other => panic!("expected builder verdict, got {other:?}"),
    }
    assert!(classify(&store, target).adders().is_none());
}

#[test]
fn test_collection_builder_defaults_leading_optional_parameters() {
    let store = core_store();
    let set = int_collection(&store, TypeDecl::class("App", "Defaulted"));
    let builder = builder_class(&store, "DefaultedBuilder");
    store.set_collection_builder(set, builder, "Build");
    let target = store.named(set, &[]);
    let span = well_known(&store, WellKnownType::ReadOnlySpanT, &[TypeId::INT]);
    let build = store.add_method(
        builder,
        MethodDecl::new("Build")
            .optional_param("capacity", TypeId::INT)
            .param("items", span)
            .returns(target)
            .flags(MethodFlags::STATIC),
    );

    match classify(&store, target) {
        ConstructibilityVerdict::CollectionBuilder { create, .. } => {
            assert_eq!(create.map(|m| m.id), Some(build));
        }
        other => panic!("expected builder verdict, got {other:?}"),
    }
}

#[test]
fn test_collection_builder_failures() {
    let store = core_store();
    let span = well_known(&store, WellKnownType::ReadOnlySpanT, &[TypeId::INT]);

    let opaque = store.declare(TypeDecl::class("App", "Opaque").assembly("Main"));
    let builder = builder_class(&store, "OpaqueBuilder");
    store.set_collection_builder(opaque, builder, "Create");
    assert_eq!(
        reason(&store, store.named(opaque, &[])),
        Some(NotConstructibleReason::NoBuilderElementType)
    );

    let wrong_return = int_collection(&store, TypeDecl::class("App", "WrongReturn"));
    let builder = builder_class(&store, "WrongReturnBuilder");
    store.set_collection_builder(wrong_return, builder, "Create");
    store.add_method(
        builder,
        MethodDecl::new("Create")
            .param("items", span)
            .returns(TypeId::OBJECT)
            .flags(MethodFlags::STATIC),
    );
    assert_eq!(
        reason(&store, store.named(wrong_return, &[])),
        Some(NotConstructibleReason::BuilderMethodNotFound(TypeId::INT))
    );

    // Only an overload needing a `with(...)` argument: constructible, but a
    // literal without arguments has nothing to call.
    let capacity_only = int_collection(&store, TypeDecl::class("App", "CapacityOnly"));
    let builder = builder_class(&store, "CapacityOnlyBuilder");
    store.set_collection_builder(capacity_only, builder, "Create");
    let target = store.named(capacity_only, &[]);
    store.add_method(
        builder,
        MethodDecl::new("Create")
            .param("capacity", TypeId::INT)
            .param("items", span)
            .returns(target)
            .flags(MethodFlags::STATIC),
    );
    match classify(&store, target) {
        ConstructibilityVerdict::CollectionBuilder {
            create, overloads, ..
        } => {
            assert!(create.is_none());
            assert_eq!(overloads.len(), 1);
        }
        other => panic!("expected builder verdict, got {other:?}"),
    }
}

#[test]
fn test_generic_builder_for_pattern_only_ref_struct() {
    let store = core_store();
    let enumerator = store.declare(TypeDecl::class("App", "BagEnumerator").type_params(&["T"]));
    let item = store.type_params_of(enumerator)[0];
    store.add_method(enumerator, MethodDecl::new("MoveNext").returns(TypeId::BOOL));
    store.add_property(enumerator, PropertyDecl::new("Current", item));

    let bag = store.declare(
        TypeDecl::ref_struct("App", "SpanBag")
            .type_params(&["T"])
            .assembly("Main"),
    );
    let t = store.type_params_of(bag)[0];
    store.add_method(
        bag,
        MethodDecl::new("GetEnumerator").returns(store.named(enumerator, &[t])),
    );
    let builder = builder_class(&store, "SpanBagBuilder");
    store.set_collection_builder(bag, builder, "Create");
    let (u_id, u) = store.method_type_param("U", 0);
    let create = store.add_method(
        builder,
        MethodDecl::new("Create")
            .generic(&[u_id])
            .param("items", well_known(&store, WellKnownType::ReadOnlySpanT, &[u]))
            .returns(store.named(bag, &[u]))
            .flags(MethodFlags::STATIC),
    );

    let target = store.named(bag, &[TypeId::STRING]);
    match classify(&store, target) {
        ConstructibilityVerdict::CollectionBuilder {
            element,
            create: Some(chosen),
            ..
        } => {
            assert_eq!(element, TypeId::STRING);
            assert_eq!(chosen.id, create);
            assert_eq!(chosen.type_args.as_slice(), &[TypeId::STRING]);
            assert_eq!(chosen.return_type, target);
        }
        other => panic!("expected builder verdict, got {other:?}"),
    }
}
