use super::*;
use csz_solver::db::TypeDecl;
use csz_solver::core_store;

#[test]
fn resolves_keywords_arrays_and_nullables() {
    let store = core_store();
    let names = TypeNames::new();
    let resolver = TypeResolver::new(&store, &names);

    assert_eq!(resolver.resolve("int"), Ok(TypeId::INT));
    assert_eq!(resolver.resolve(" string "), Ok(TypeId::STRING));
    assert_eq!(resolver.resolve("int[]"), Ok(store.array(TypeId::INT, 1)));
    assert_eq!(resolver.resolve("int[,]"), Ok(store.array(TypeId::INT, 2)));
    assert_eq!(
        resolver.resolve("int[][]"),
        Ok(store.array(store.array(TypeId::INT, 1), 1))
    );
    assert_eq!(resolver.resolve("int?"), Ok(store.nullable(TypeId::INT)));
    assert_eq!(resolver.resolve("string?"), Ok(store.nullable_ref(TypeId::STRING)));
}

#[test]
fn resolves_well_known_types() {
    let store = core_store();
    let names = TypeNames::new();
    let resolver = TypeResolver::new(&store, &names);
    let list = store.well_known_type(WellKnownType::ListT, &[TypeId::INT]);

    assert_eq!(resolver.resolve("List<int>").ok(), list);
    assert_eq!(resolver.resolve("System.Collections.Generic.List<int>").ok(), list);
    assert_eq!(
        resolver.resolve("IEnumerable").ok(),
        store.well_known_type(WellKnownType::IEnumerable, &[])
    );
    assert_eq!(
        resolver.resolve("Dictionary<int, IEnumerable<string>>"),
        Err(TypeNameError::Unknown {
            name: "Dictionary".to_string(),
            arity: 2
        })
    );
    assert_eq!(
        resolver.resolve("Lock.Scope").ok(),
        store.well_known_type(WellKnownType::LockScope, &[])
    );
    assert_eq!(
        resolver.resolve("ReadOnlySpan<byte>").ok(),
        store.well_known_type(WellKnownType::ReadOnlySpanT, &[TypeId::BYTE])
    );
}

#[test]
fn resolves_declared_types_and_params() {
    let store = core_store();
    let def = store.declare(TypeDecl::class("App", "Bag").type_params(&["T"]).assembly("Main"));
    let mut names = TypeNames::new();
    names.register("Bag", 1, def).expect("first registration");
    names.register("App.Bag", 1, def).expect("first registration");
    assert_eq!(
        names.register("Bag", 1, def),
        Err(TypeNameError::Duplicate("Bag".to_string()))
    );

    let (_, t) = store.method_type_param("T", 0);
    let resolver = TypeResolver::new(&store, &names).with_params([("T".to_string(), t)]);
    assert_eq!(resolver.resolve("Bag<int>"), Ok(store.named(def, &[TypeId::INT])));
    assert_eq!(resolver.resolve("App.Bag<T>"), Ok(store.named(def, &[t])));
    assert_eq!(resolver.resolve("T[]"), Ok(store.array(t, 1)));
}

#[test]
fn reports_malformed_names() {
    let store = core_store();
    let names = TypeNames::new();
    let resolver = TypeResolver::new(&store, &names);

    assert!(matches!(
        resolver.resolve("List<int"),
        Err(TypeNameError::Unexpected { .. })
    ));
    assert!(matches!(resolver.resolve("int]"), Err(TypeNameError::Unexpected { offset: 3, .. })));
    assert!(matches!(resolver.resolve(""), Err(TypeNameError::Unexpected { .. })));
    assert_eq!(
        resolver.resolve("List"),
        Err(TypeNameError::Unknown {
            name: "List".to_string(),
            arity: 0
        })
    );
}
