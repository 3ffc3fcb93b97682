use super::*;
use crate::corlib::CoreLibraryBuilder;
use crate::db::{MethodDecl, TypeDecl, TypeStore};
use crate::def::WellKnownType;
use crate::types::TypeParamConstraints;

fn setup() -> TypeStore {
    let store = TypeStore::new();
    CoreLibraryBuilder::new().install(&store);
    store
}

#[test]
fn test_intrinsics_use_keywords() {
    let store = setup();
    let fmt = TypeFormatter::new(&store);
    assert_eq!(fmt.format(TypeId::INT), "int");
    assert_eq!(fmt.format(TypeId::STRING), "string");
    assert_eq!(fmt.format(TypeId::OBJECT), "object");
}

#[test]
fn test_constructed_and_composite_types() {
    let store = setup();
    let fmt = TypeFormatter::new(&store);
    let list = store
        .well_known_type(WellKnownType::ListT, &[TypeId::INT])
        .expect("List<T> installed");
    assert_eq!(fmt.format(list), "List<int>");
    assert_eq!(fmt.format(store.array(TypeId::INT, 1)), "int[]");
    assert_eq!(fmt.format(store.array(TypeId::STRING, 2)), "string[,]");
    assert_eq!(fmt.format(store.nullable(TypeId::INT)), "int?");
    assert_eq!(fmt.format(store.nullable_ref(TypeId::STRING)), "string?");
    assert_eq!(fmt.format(store.pointer(TypeId::BYTE)), "byte*");
    assert_eq!(
        fmt.format(store.array(list, 1)),
        "List<int>[]",
        "element type keeps its arguments"
    );
}

#[test]
fn test_nested_type_uses_dotted_name() {
    let store = setup();
    let scope = store
        .well_known_type(WellKnownType::LockScope, &[])
        .expect("Lock.Scope installed");
    assert_eq!(TypeFormatter::new(&store).format(scope), "Lock.Scope");
    assert_eq!(
        TypeFormatter::new(&store).qualified().format(scope),
        "System.Threading.Lock.Scope"
    );
}

#[test]
fn test_type_parameter_uses_declared_name() {
    let store = setup();
    let def = store.declare(TypeDecl::class("App", "Box").type_params(&["TItem"]));
    let t = store.type_params_of(def)[0];
    store.set_constraints(t, TypeParamConstraints::default());
    assert_eq!(TypeFormatter::new(&store).format(store.self_type(def)), "Box<TItem>");
}

#[test]
fn test_method_rendering_substitutes_declaring_arguments() {
    let store = setup();
    let def = store.declare(TypeDecl::class("App", "Bag").type_params(&["T"]));
    let t = store.type_params_of(def)[0];
    let add = store.add_method(def, MethodDecl::new("Add").param("item", t));
    let ctor = store.add_method(def, MethodDecl::constructor().param("capacity", TypeId::INT));

    let bag_of_int = store.named(def, &[TypeId::INT]);
    let resolved = ResolvedMethod::new(&store, add, bag_of_int, 0).expect("method exists");
    let fmt = TypeFormatter::new(&store);
    assert_eq!(fmt.format_method(&resolved), "Bag<int>.Add(int)");
    assert_eq!(fmt.format_method_id(add), "Bag<T>.Add(T)");
    assert_eq!(fmt.format_method_id(ctor), "Bag<T>.Bag(int)");
}

#[test]
fn test_extension_receiver_is_marked() {
    let store = setup();
    let statics = store.declare(TypeDecl::class("App", "Extensions"));
    let ext = store.add_method(
        statics,
        MethodDecl::new("Add").extension(TypeId::STRING).param("value", TypeId::INT),
    );
    assert_eq!(
        TypeFormatter::new(&store).format_method_id(ext),
        "Extensions.Add(this string, int)"
    );
}
