//! A minimal core library: the collection interfaces, `List<T>`, spans and
//! the locking types, declared through the same builders a fixture uses.
//!
//! Tests and the probe binary start from this library and add their own
//! declarations. Pieces can be left out to model older or custom runtimes
//! (`without(WellKnownType::ListT)`, `without_member(WellKnownMember::SpanCtorArray)`).

use crate::db::{MethodDecl, PropertyDecl, TypeDatabase, TypeDecl, TypeStore};
use crate::def::{DefFlags, DefId, WellKnownType};
use crate::types::{MethodFlags, TypeId};
use crate::well_known::WellKnownMember;
use csz_common::language::Feature;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Definitions installed by [`CoreLibraryBuilder::install`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreLibrary {
    pub ienumerable: Option<DefId>,
    pub ienumerator: Option<DefId>,
    pub idisposable: Option<DefId>,
    pub icollection: Option<DefId>,
    pub ilist: Option<DefId>,
    pub ienumerable_t: Option<DefId>,
    pub ienumerator_t: Option<DefId>,
    pub icollection_t: Option<DefId>,
    pub ilist_t: Option<DefId>,
    pub ireadonly_collection_t: Option<DefId>,
    pub ireadonly_list_t: Option<DefId>,
    pub list_t: Option<DefId>,
    pub span_t: Option<DefId>,
    pub readonly_span_t: Option<DefId>,
    pub lock: Option<DefId>,
    pub lock_scope: Option<DefId>,
    pub monitor: Option<DefId>,
}

#[derive(Clone, Debug, Default)]
pub struct CoreLibraryBuilder {
    skipped_types: FxHashSet<WellKnownType>,
    skipped_members: FxHashSet<WellKnownMember>,
}

impl CoreLibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(mut self, ty: WellKnownType) -> Self {
        self.skipped_types.insert(ty);
        self
    }

    pub fn without_member(mut self, member: WellKnownMember) -> Self {
        self.skipped_members.insert(member);
        self
    }

    fn has(&self, ty: WellKnownType) -> bool {
        !self.skipped_types.contains(&ty)
    }

    fn has_member(&self, member: WellKnownMember) -> bool {
        !self.skipped_members.contains(&member)
    }

    fn declare_interface(
        &self,
        store: &TypeStore,
        tag: WellKnownType,
        type_params: &[&str],
    ) -> Option<DefId> {
        if !self.has(tag) {
            return None;
        }
        let (ns, name, _) = tag.metadata_name();
        Some(store.declare(TypeDecl::interface(ns, name).type_params(type_params)))
    }

    pub fn install(&self, store: &TypeStore) -> CoreLibrary {
        let mut lib = CoreLibrary::default();

        // Non-generic enumeration.
        lib.ienumerator = self.declare_interface(store, WellKnownType::IEnumerator, &[]);
        let ienumerator = lib.ienumerator.map(|d| store.named(d, &[]));
        if let Some(def) = lib.ienumerator {
            store.add_method(def, MethodDecl::new("MoveNext").returns(TypeId::BOOL));
            store.add_property(def, PropertyDecl::new("Current", TypeId::OBJECT));
        }

        lib.idisposable = self.declare_interface(store, WellKnownType::IDisposable, &[]);
        let idisposable = lib.idisposable.map(|d| store.named(d, &[]));
        if let Some(def) = lib.idisposable {
            store.add_method(def, MethodDecl::new("Dispose"));
        }

        lib.ienumerable = self.declare_interface(store, WellKnownType::IEnumerable, &[]);
        let ienumerable = lib.ienumerable.map(|d| store.named(d, &[]));
        if let (Some(def), Some(enumerator)) = (lib.ienumerable, ienumerator) {
            store.add_method(def, MethodDecl::new("GetEnumerator").returns(enumerator));
        }

        lib.icollection = self.declare_interface(store, WellKnownType::ICollection, &[]);
        if let Some(def) = lib.icollection {
            if let Some(base) = ienumerable {
                store.add_interface(def, base);
            }
            store.add_property(def, PropertyDecl::new("Count", TypeId::INT));
        }
        lib.ilist = self.declare_interface(store, WellKnownType::IList, &[]);
        if let Some(def) = lib.ilist {
            if let Some(base) = lib.icollection {
                store.add_interface(def, store.named(base, &[]));
            }
            if let Some(base) = ienumerable {
                store.add_interface(def, base);
            }
            store.add_method(
                def,
                MethodDecl::new("Add").param("value", TypeId::OBJECT).returns(TypeId::INT),
            );
        }

        // Generic enumeration.
        lib.ienumerator_t = self.declare_interface(store, WellKnownType::IEnumeratorT, &["T"]);
        if let Some(def) = lib.ienumerator_t {
            let t = store.type_params_of(def)[0];
            for base in [ienumerator, idisposable].into_iter().flatten() {
                store.add_interface(def, base);
            }
            let mut current = PropertyDecl::new("Current", t);
            current.is_new = true;
            store.add_property(def, current);
        }

        lib.ienumerable_t = self.declare_interface(store, WellKnownType::IEnumerableT, &["T"]);
        if let Some(def) = lib.ienumerable_t {
            let t = store.type_params_of(def)[0];
            if let Some(base) = ienumerable {
                store.add_interface(def, base);
            }
            if let Some(enumerator) = lib.ienumerator_t {
                store.add_method(
                    def,
                    MethodDecl::new("GetEnumerator")
                        .returns(store.named(enumerator, &[t]))
                        .flags(MethodFlags::NEW),
                );
            }
        }

        lib.ireadonly_collection_t =
            self.declare_interface(store, WellKnownType::IReadOnlyCollectionT, &["T"]);
        if let Some(def) = lib.ireadonly_collection_t {
            let t = store.type_params_of(def)[0];
            if let Some(base) = lib.ienumerable_t {
                store.add_interface(def, store.named(base, &[t]));
            }
            store.add_property(def, PropertyDecl::new("Count", TypeId::INT));
        }

        lib.ireadonly_list_t = self.declare_interface(store, WellKnownType::IReadOnlyListT, &["T"]);
        if let Some(def) = lib.ireadonly_list_t {
            let t = store.type_params_of(def)[0];
            if let Some(base) = lib.ireadonly_collection_t {
                store.add_interface(def, store.named(base, &[t]));
            }
        }

        lib.icollection_t = self.declare_interface(store, WellKnownType::ICollectionT, &["T"]);
        if let Some(def) = lib.icollection_t {
            let t = store.type_params_of(def)[0];
            if let Some(base) = lib.ienumerable_t {
                store.add_interface(def, store.named(base, &[t]));
            }
            store.add_property(def, PropertyDecl::new("Count", TypeId::INT));
            store.add_method(def, MethodDecl::new("Add").param("item", t));
        }

        lib.ilist_t = self.declare_interface(store, WellKnownType::IListT, &["T"]);
        if let Some(def) = lib.ilist_t {
            let t = store.type_params_of(def)[0];
            if let Some(base) = lib.icollection_t {
                store.add_interface(def, store.named(base, &[t]));
            }
        }

        lib.list_t = self.install_list(store, &lib, ienumerable);
        self.install_spans(store, &mut lib);
        self.install_locking(store, &mut lib);

        debug!(definitions = store.defs().len(), "core library installed");
        lib
    }

    fn install_list(
        &self,
        store: &TypeStore,
        lib: &CoreLibrary,
        ienumerable: Option<TypeId>,
    ) -> Option<DefId> {
        if !self.has(WellKnownType::ListT) {
            return None;
        }
        let def = store
            .declare(TypeDecl::class("System.Collections.Generic", "List").type_params(&["T"]));
        let t = store.type_params_of(def)[0];
        for iface in [lib.ilist_t, lib.ireadonly_list_t].into_iter().flatten() {
            store.add_interface(def, store.named(iface, &[t]));
        }
        if let Some(ilist) = lib.ilist {
            store.add_interface(def, store.named(ilist, &[]));
        }
        if let Some(base) = ienumerable {
            store.add_interface(def, base);
        }

        if self.has_member(WellKnownMember::ListCtor) {
            store.add_method(def, MethodDecl::constructor());
        }
        store.add_method(def, MethodDecl::constructor().param("capacity", TypeId::INT));
        if self.has_member(WellKnownMember::ListAdd) {
            store.add_method(def, MethodDecl::new("Add").param("item", t));
        }
        if let Some(ienum_t) = lib.ienumerable_t {
            let source = store.named(ienum_t, &[t]);
            store.add_method(def, MethodDecl::constructor().param("collection", source));
            if self.has_member(WellKnownMember::ListAddRange) {
                store.add_method(def, MethodDecl::new("AddRange").param("collection", source));
            }
        }
        if let Some(enumerator) = lib.ienumerator_t {
            store.add_method(
                def,
                MethodDecl::new("GetEnumerator").returns(store.named(enumerator, &[t])),
            );
        }
        store.add_property(def, PropertyDecl::new("Count", TypeId::INT));
        Some(def)
    }

    fn install_spans(&self, store: &TypeStore, lib: &mut CoreLibrary) {
        for (tag, member) in [
            (WellKnownType::SpanT, WellKnownMember::SpanCtorArray),
            (WellKnownType::ReadOnlySpanT, WellKnownMember::ReadOnlySpanCtorArray),
        ] {
            if !self.has(tag) {
                continue;
            }
            let (ns, name, _) = tag.metadata_name();
            let def = store.declare(TypeDecl::ref_struct(ns, name).type_params(&["T"]));
            let t = store.type_params_of(def)[0];
            if self.has_member(member) {
                store.add_method(def, MethodDecl::constructor().param("array", store.array(t, 1)));
            }
            store.add_property(def, PropertyDecl::new("Length", TypeId::INT));
            if tag == WellKnownType::SpanT {
                lib.span_t = Some(def);
            } else {
                lib.readonly_span_t = Some(def);
            }
        }
    }

    fn install_locking(&self, store: &TypeStore, lib: &mut CoreLibrary) {
        if self.has(WellKnownType::Lock) {
            let def = store.declare(
                TypeDecl::class("System.Threading", "Lock").flags(DefFlags::SEALED),
            );
            store.add_method(def, MethodDecl::constructor());
            store.add_method(def, MethodDecl::new("Enter"));
            store.add_method(def, MethodDecl::new("Exit"));
            lib.lock = Some(def);

            if self.has(WellKnownType::LockScope) {
                let scope = store
                    .declare(TypeDecl::ref_struct("System.Threading", "Scope").nested_in(def));
                if self.has_member(WellKnownMember::LockScopeDispose) {
                    store.add_method(scope, MethodDecl::new("Dispose"));
                }
                lib.lock_scope = Some(scope);
                if self.has_member(WellKnownMember::LockEnterScope) {
                    store.add_method(
                        def,
                        MethodDecl::new("EnterScope")
                            .returns(store.named(scope, &[]))
                            .requires(Feature::LockObject),
                    );
                }
            }
        }

        if self.has(WellKnownType::Monitor) {
            let def = store.declare(
                TypeDecl::class("System.Threading", "Monitor")
                    .flags(DefFlags::STATIC | DefFlags::ABSTRACT | DefFlags::SEALED),
            );
            if self.has_member(WellKnownMember::MonitorEnter) {
                store.add_method(
                    def,
                    MethodDecl::new("Enter")
                        .flags(MethodFlags::STATIC)
                        .param("obj", TypeId::OBJECT)
                        .ref_param("lockTaken", TypeId::BOOL),
                );
            }
            if self.has_member(WellKnownMember::MonitorExit) {
                store.add_method(
                    def,
                    MethodDecl::new("Exit")
                        .flags(MethodFlags::STATIC)
                        .param("obj", TypeId::OBJECT),
                );
            }
            lib.monitor = Some(def);
        }
    }
}

/// A store preloaded with the full core library.
pub fn core_store() -> TypeStore {
    let store = TypeStore::new();
    CoreLibraryBuilder::new().install(&store);
    store
}

#[cfg(test)]
#[path = "../tests/corlib_tests.rs"]
mod tests;
