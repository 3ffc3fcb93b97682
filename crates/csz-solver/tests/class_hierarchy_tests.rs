use super::*;
use crate::corlib::core_store;
use crate::db::{MethodDecl, PropertyDecl, TypeDecl, TypeStore};
use crate::types::TypeParamConstraints;

fn main_ctx(store: &TypeStore, within: Option<DefId>) -> AccessContext {
    AccessContext::new(within, store.atom("Main"))
}

#[test]
fn test_private_member_visible_only_inside() {
    let store = core_store();
    let outer = store.declare(TypeDecl::class("App", "Outer").assembly("Main"));
    let nested = store.declare(TypeDecl::class("App", "Inner").nested_in(outer).assembly("Main"));
    let other = store.declare(TypeDecl::class("App", "Other").assembly("Main"));

    assert!(is_accessible(&store, Accessibility::Private, outer, &main_ctx(&store, Some(outer))));
    assert!(
        is_accessible(&store, Accessibility::Private, outer, &main_ctx(&store, Some(nested))),
        "nested types see private members of their container"
    );
    assert!(!is_accessible(&store, Accessibility::Private, outer, &main_ctx(&store, Some(other))));
    assert!(!is_accessible(&store, Accessibility::Private, outer, &main_ctx(&store, None)));
}

#[test]
fn test_internal_depends_on_assembly() {
    let store = core_store();
    let here = store.declare(TypeDecl::class("App", "Here").assembly("Main"));
    let there = store.declare(TypeDecl::class("Lib", "There").assembly("Other"));
    let ctx = main_ctx(&store, None);
    assert!(is_accessible(&store, Accessibility::Internal, here, &ctx));
    assert!(!is_accessible(&store, Accessibility::Internal, there, &ctx));

    let hidden = store.declare(
        TypeDecl::class("Lib", "Hidden")
            .assembly("Other")
            .accessibility(Accessibility::Internal),
    );
    assert!(!is_type_accessible(&store, hidden, &ctx));
    assert!(
        !is_accessible(&store, Accessibility::Public, hidden, &ctx),
        "public members of an invisible type are invisible"
    );
}

#[test]
fn test_protected_requires_derivation() {
    let store = core_store();
    let base = store.declare(TypeDecl::class("Lib", "Base").assembly("Other"));
    let derived = store.declare(TypeDecl::class("App", "Derived").assembly("Main"));
    store.set_base(derived, store.named(base, &[]));
    let unrelated = store.declare(TypeDecl::class("App", "Unrelated").assembly("Main"));

    assert!(is_accessible(&store, Accessibility::Protected, base, &main_ctx(&store, Some(derived))));
    assert!(!is_accessible(&store, Accessibility::Protected, base, &main_ctx(&store, Some(unrelated))));
    assert!(!is_accessible(
        &store,
        Accessibility::PrivateProtected,
        base,
        &main_ctx(&store, Some(derived))
    ));
}

#[test]
fn test_base_chain_substitutes_generic_base() {
    let store = core_store();
    let list = store.defs().well_known(WellKnownType::ListT).expect("List<T>");
    let def = store.declare(TypeDecl::class("App", "Wrapper").type_params(&["U"]));
    let u = store.type_params_of(def)[0];
    store.set_base(def, store.named(list, &[store.array(u, 1)]));

    let wrapper = store.named(def, &[TypeId::STRING]);
    let chain = base_chain(&store, wrapper);
    assert_eq!(
        chain,
        vec![
            store.named(list, &[store.array(TypeId::STRING, 1)]),
            TypeId::OBJECT
        ]
    );
    assert!(derives_from(&store, def, list));
}

#[test]
fn test_base_chain_stops_on_cycle() {
    let store = TypeStore::new();
    let a = store.declare(TypeDecl::class("App", "A"));
    let b = store.declare(TypeDecl::class("App", "B"));
    store.set_base(a, store.named(b, &[]));
    store.set_base(b, store.named(a, &[]));
    let chain = base_chain(&store, store.named(a, &[]));
    assert!(chain.len() <= 2, "{chain:?}");
    assert!(derives_from(&store, a, b));
}

#[test]
fn test_type_categories() {
    let store = core_store();
    let s = store.declare(TypeDecl::structure("App", "Point"));
    let point = store.named(s, &[]);
    assert!(is_value_type(&store, point));
    assert!(!is_reference_type(&store, point));
    assert!(is_reference_type(&store, store.array(point, 1)));
    assert!(is_value_type(&store, store.nullable(point)));
    assert!(is_reference_type(&store, store.nullable_ref(TypeId::STRING)));

    let (_, t) = store.method_type_param("T", 0);
    assert!(!is_reference_type(&store, t));
    assert!(!is_value_type(&store, t));
    store.set_constraints(
        t,
        TypeParamConstraints {
            reference_type: true,
            ..Default::default()
        },
    );
    assert!(is_reference_type(&store, t));
}

#[test]
fn test_string_and_arrays_have_built_in_interfaces() {
    let store = core_store();
    let enumerable_char = store
        .well_known_type(WellKnownType::IEnumerableT, &[TypeId::CHAR])
        .expect("IEnumerable<T>");
    assert!(implements_interface(&store, TypeId::STRING, enumerable_char));

    let ints = store.array(TypeId::INT, 1);
    let enumerable_int = store
        .well_known_type(WellKnownType::IEnumerableT, &[TypeId::INT])
        .expect("IEnumerable<T>");
    assert!(implements_interface(&store, ints, enumerable_int));
    let multi = store.array(TypeId::INT, 2);
    assert!(!implements_interface(&store, multi, enumerable_int));
}

#[test]
fn test_find_interface_instantiations_reports_each() {
    let store = core_store();
    let ienum = store.defs().well_known(WellKnownType::IEnumerableT).expect("IEnumerable<T>");
    let def = store.declare(TypeDecl::class("App", "Both"));
    store.add_interface(def, store.named(ienum, &[TypeId::INT]));
    store.add_interface(def, store.named(ienum, &[TypeId::STRING]));
    let found = find_interface_instantiations(&store, store.named(def, &[]), WellKnownType::IEnumerableT);
    assert_eq!(
        found,
        vec![store.named(ienum, &[TypeId::INT]), store.named(ienum, &[TypeId::STRING])]
    );
}

#[test]
fn test_override_replaces_base_member() {
    let store = core_store();
    let base = store.declare(TypeDecl::class("App", "Base"));
    store.add_method(base, MethodDecl::new("Add").param("x", TypeId::INT));
    store.add_method(base, MethodDecl::new("Add").param("x", TypeId::STRING));
    let derived = store.declare(TypeDecl::class("App", "Derived"));
    store.set_base(derived, store.named(base, &[]));
    let over = store.add_method(
        derived,
        MethodDecl::new("Add")
            .param("x", TypeId::INT)
            .flags(MethodFlags::OVERRIDE | MethodFlags::VIRTUAL),
    );

    let table = build_member_table(&store, store.named(derived, &[]));
    let adds = table.methods(store.atom("Add"));
    assert_eq!(adds.len(), 2);
    assert_eq!(adds[0].method, over);
    assert_eq!(adds[0].depth, 0);
    assert_eq!(adds[1].depth, 1, "string overload inherited");
}

#[test]
fn test_new_hides_every_base_overload() {
    let store = core_store();
    let base = store.declare(TypeDecl::class("App", "Base"));
    store.add_method(base, MethodDecl::new("Add").param("x", TypeId::INT));
    store.add_method(base, MethodDecl::new("Add").param("x", TypeId::STRING));
    let derived = store.declare(TypeDecl::class("App", "Derived"));
    store.set_base(derived, store.named(base, &[]));
    store.add_method(
        derived,
        MethodDecl::new("Add").param("x", TypeId::OBJECT).flags(MethodFlags::NEW),
    );
    let table = build_member_table(&store, store.named(derived, &[]));
    assert_eq!(table.methods(store.atom("Add")).len(), 1);
}

#[test]
fn test_constructors_are_not_inherited_and_properties_hide_by_name() {
    let store = core_store();
    let base = store.declare(TypeDecl::class("App", "Base"));
    store.add_method(base, MethodDecl::constructor());
    store.add_property(base, PropertyDecl::new("Current", TypeId::OBJECT));
    let derived = store.declare(TypeDecl::class("App", "Derived"));
    store.set_base(derived, store.named(base, &[]));
    let own = store.add_property(derived, PropertyDecl::new("Current", TypeId::INT));

    let table = build_member_table(&store, store.named(derived, &[]));
    assert!(table.methods(store.atom(".ctor")).is_empty());
    let current = table.properties(store.atom("Current"));
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].property, own);
    assert_eq!(current[0].resolved_type(&store), Some(TypeId::INT));
}

#[test]
fn test_interface_tables_include_inherited_interfaces() {
    let store = core_store();
    let enumerator = store
        .well_known_type(WellKnownType::IEnumeratorT, &[TypeId::STRING])
        .expect("IEnumerator<T>");
    let table = build_member_table(&store, enumerator);
    assert_eq!(table.methods(store.atom("MoveNext")).len(), 1);
    let current = table.properties(store.atom("Current"));
    assert_eq!(current.len(), 1, "generic Current hides object Current");
    assert_eq!(current[0].resolved_type(&store), Some(TypeId::STRING));
}

#[test]
fn test_resolved_method_substitutes_and_skips_receiver() {
    let store = core_store();
    let list = store
        .well_known_type(WellKnownType::ListT, &[TypeId::INT])
        .expect("List<T>");
    let add = crate::well_known::lookup_member(&store, crate::well_known::WellKnownMember::ListAdd)
        .expect("List.Add");
    let resolved = ResolvedMethod::new(&store, add, list, 0).expect("resolved");
    assert_eq!(resolved.params[0].ty, TypeId::INT);
    assert_eq!(resolved.required_param_count(), 1);

    let statics = store.declare(TypeDecl::class("App", "Ext"));
    let ext = store.add_method(
        statics,
        MethodDecl::new("Add")
            .extension(TypeId::STRING)
            .param("value", TypeId::INT)
            .optional_param("flag", TypeId::BOOL),
    );
    let ext = ResolvedMethod::new(&store, ext, store.named(statics, &[]), 0).expect("resolved");
    assert!(ext.is_extension);
    assert_eq!(ext.call_params().len(), 2);
    assert_eq!(ext.call_params()[0].ty, TypeId::INT);
    assert_eq!(ext.required_param_count(), 2, "receiver plus value");
}

#[test]
fn test_member_table_is_cached() {
    let store = core_store();
    let caches = SolverCaches::new();
    let list = store
        .well_known_type(WellKnownType::ListT, &[TypeId::INT])
        .expect("List<T>");
    let a = member_table(&store, &caches, list);
    let b = member_table(&store, &caches, list);
    assert!(Arc::ptr_eq(&a, &b));
}
