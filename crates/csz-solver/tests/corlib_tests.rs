use super::*;
use crate::class_hierarchy::{all_interfaces, is_ref_like};

#[test]
fn test_full_install_registers_every_well_known_type() {
    let store = TypeStore::new();
    CoreLibraryBuilder::new().install(&store);
    for tag in WellKnownType::ALL {
        assert!(store.defs().well_known(tag).is_some(), "{tag:?}");
    }
}

#[test]
fn test_without_skips_type_and_dependents() {
    let store = TypeStore::new();
    let lib = CoreLibraryBuilder::new()
        .without(WellKnownType::Lock)
        .install(&store);
    assert_eq!(lib.lock, None);
    assert_eq!(lib.lock_scope, None, "the scope type is nested in Lock");
    assert!(lib.monitor.is_some());
    assert_eq!(store.defs().well_known(WellKnownType::Lock), None);
}

#[test]
fn test_list_implements_generic_and_non_generic_interfaces() {
    let store = TypeStore::new();
    let lib = CoreLibraryBuilder::new().install(&store);
    let list = store.named(lib.list_t.expect("List<T>"), &[TypeId::INT]);
    let interfaces = all_interfaces(&store, list);
    let expect = |tag: WellKnownType, args: &[TypeId]| {
        store.well_known_type(tag, args).expect("interface installed")
    };
    for iface in [
        expect(WellKnownType::IListT, &[TypeId::INT]),
        expect(WellKnownType::ICollectionT, &[TypeId::INT]),
        expect(WellKnownType::IEnumerableT, &[TypeId::INT]),
        expect(WellKnownType::IReadOnlyListT, &[TypeId::INT]),
        expect(WellKnownType::IEnumerable, &[]),
        expect(WellKnownType::IList, &[]),
    ] {
        assert!(interfaces.contains(&iface), "missing {iface:?}");
    }
}

#[test]
fn test_spans_and_scope_are_ref_like() {
    let store = TypeStore::new();
    let lib = CoreLibraryBuilder::new().install(&store);
    let span = store.named(lib.span_t.expect("Span<T>"), &[TypeId::INT]);
    let scope = store.named(lib.lock_scope.expect("Lock.Scope"), &[]);
    assert!(is_ref_like(&store, span));
    assert!(is_ref_like(&store, scope));
    let lock = store.named(lib.lock.expect("Lock"), &[]);
    assert!(!is_ref_like(&store, lock));
}

#[test]
fn test_enter_scope_requires_lock_feature() {
    let store = core_store();
    let lock = store.defs().well_known(WellKnownType::Lock).expect("Lock");
    let enter_scope = store.atom("EnterScope");
    let feature = store
        .defs()
        .get_methods(lock)
        .into_iter()
        .filter_map(|id| store.defs().method(id))
        .find(|info| info.name == enter_scope)
        .and_then(|info| info.required_feature);
    assert_eq!(feature, Some(Feature::LockObject));
}
