use super::*;
use crate::types::{Accessibility, MethodFlags, MethodKind, TypeParamConstraints, TypeParamOwner};
use csz_common::interner::ShardedInterner;

fn class(atoms: &ShardedInterner, ns: &str, name: &str) -> DefinitionInfo {
    DefinitionInfo::new(
        DefKind::Class,
        atoms.intern(ns),
        atoms.intern(name),
        atoms.intern("Main"),
    )
}

fn method(atoms: &ShardedInterner, declaring: DefId, name: &str) -> MethodInfo {
    MethodInfo {
        name: atoms.intern(name),
        declaring,
        kind: MethodKind::Ordinary,
        accessibility: Accessibility::Public,
        flags: MethodFlags::empty(),
        type_params: Vec::new(),
        params: Vec::new(),
        return_type: TypeId::VOID,
        explicit_interface: None,
        conditional: None,
        required_feature: None,
    }
}

#[test]
fn test_register_allocates_sequential_ids() {
    let atoms = ShardedInterner::new();
    let store = DefinitionStore::new();
    let a = store.register(class(&atoms, "N", "A"));
    let b = store.register(class(&atoms, "N", "B"));
    assert!(a.is_valid());
    assert!(!DefId::INVALID.is_valid());
    assert_eq!(b.0, a.0 + 1);
    assert_eq!(store.len(), 2);
    assert_eq!(store.all_ids(), vec![a, b]);
}

#[test]
fn test_first_well_known_registration_wins() {
    let atoms = ShardedInterner::new();
    let store = DefinitionStore::new();
    let mut first = class(&atoms, "System.Threading", "Lock");
    first.well_known = Some(WellKnownType::Lock);
    let mut second = first.clone();
    second.name = atoms.intern("Lock2");
    let first = store.register(first);
    store.register(second);
    assert_eq!(store.well_known(WellKnownType::Lock), Some(first));
    assert_eq!(store.well_known(WellKnownType::Monitor), None);
}

#[test]
fn test_add_method_links_declaring_type() {
    let atoms = ShardedInterner::new();
    let store = DefinitionStore::new();
    let def = store.register(class(&atoms, "N", "C"));
    let add = store.add_method(method(&atoms, def, "Add"));
    assert_eq!(store.get_methods(def), vec![add]);
    let info = store.method(add).unwrap();
    assert_eq!(info.declaring, def);
    assert!(store.extension_methods(atoms.intern("Add")).is_empty());
}

#[test]
fn test_extension_methods_are_indexed_by_name() {
    let atoms = ShardedInterner::new();
    let store = DefinitionStore::new();
    let mut holder = class(&atoms, "N", "Extensions");
    holder.flags = DefFlags::STATIC;
    let holder = store.register(holder);
    let mut ext = method(&atoms, holder, "Add");
    ext.flags = MethodFlags::STATIC | MethodFlags::EXTENSION;
    let id = store.add_method(ext);
    assert_eq!(store.extension_methods(atoms.intern("Add")), vec![id]);
}

#[test]
fn test_method_type_params_are_attached_to_their_method() {
    let atoms = ShardedInterner::new();
    let store = DefinitionStore::new();
    let def = store.register(class(&atoms, "N", "C"));
    let tp = store.add_type_param(TypeParamInfo {
        name: atoms.intern("U"),
        owner: TypeParamOwner::Pending,
        index: 0,
        constraints: TypeParamConstraints::default(),
    });
    let mut generic = method(&atoms, def, "Add");
    generic.type_params = vec![tp];
    let id = store.add_method(generic);
    assert_eq!(store.type_param(tp).unwrap().owner, TypeParamOwner::Method(id));
}

#[test]
fn test_metadata_names_round_trip() {
    for tag in WellKnownType::ALL {
        let (ns, name, arity) = tag.metadata_name();
        assert_eq!(WellKnownType::from_metadata_name(ns, name, arity), Some(tag));
    }
    assert_eq!(WellKnownType::LockScope.full_name(), "System.Threading.Lock+Scope");
}

#[test]
fn test_collection_interface_classification() {
    assert!(WellKnownType::IReadOnlyListT.is_collection_interface());
    assert!(WellKnownType::IReadOnlyListT.is_read_only_interface());
    assert!(WellKnownType::IListT.is_collection_interface());
    assert!(!WellKnownType::IListT.is_read_only_interface());
    assert!(!WellKnownType::ListT.is_collection_interface());
    assert!(!WellKnownType::IEnumerator.is_collection_interface());
}
