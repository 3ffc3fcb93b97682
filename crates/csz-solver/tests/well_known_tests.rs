use super::*;
use crate::corlib::{CoreLibraryBuilder, core_store};
use crate::db::{MethodDecl, TypeDecl, TypeStore};

#[test]
fn test_every_member_found_in_core_library() {
    let store = core_store();
    for member in WellKnownMember::ALL {
        assert!(lookup_member(&store, member).is_some(), "{member:?}");
    }
}

#[test]
fn test_missing_member_is_none() {
    let store = TypeStore::new();
    CoreLibraryBuilder::new()
        .without_member(WellKnownMember::SpanCtorArray)
        .install(&store);
    assert_eq!(lookup_member(&store, WellKnownMember::SpanCtorArray), None);
    assert!(lookup_member(&store, WellKnownMember::ReadOnlySpanCtorArray).is_some());
}

#[test]
fn test_list_ctor_ignores_capacity_overload() {
    let store = core_store();
    let id = lookup_member(&store, WellKnownMember::ListCtor).expect("List..ctor()");
    let info = store.defs().method(id).expect("method info");
    assert!(info.params.is_empty());
}

#[test]
fn test_shape_mismatch_is_not_accepted() {
    let store = TypeStore::new();
    CoreLibraryBuilder::new()
        .without(WellKnownType::Monitor)
        .install(&store);
    // A Monitor whose Enter lacks the by-ref flag.
    let monitor = store.declare(TypeDecl::class("System.Threading", "Monitor"));
    store.add_method(
        monitor,
        MethodDecl::new("Enter")
            .flags(crate::types::MethodFlags::STATIC)
            .param("obj", TypeId::OBJECT)
            .param("lockTaken", TypeId::BOOL),
    );
    assert_eq!(lookup_member(&store, WellKnownMember::MonitorEnter), None);
}

#[test]
fn test_display_names() {
    assert_eq!(WellKnownMember::SpanCtorArray.display(), "System.Span`1..ctor");
    assert_eq!(
        WellKnownMember::LockScopeDispose.display(),
        "System.Threading.Lock+Scope.Dispose"
    );
    assert_eq!(WellKnownMember::MonitorExit.container_display(), "System.Threading.Monitor");
}
