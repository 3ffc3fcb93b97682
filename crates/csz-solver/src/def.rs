//! Definition identifiers and storage for the solver.
//!
//! Every class, struct, interface, enum and delegate known to an analysis run
//! is registered here, together with the arenas for its methods, properties
//! and type parameters. The store is filled before analysis starts and is
//! read-mostly afterwards; `DashMap` keeps it shareable across the worker
//! threads that analyse method bodies.
//!
//! | Kind | Value type | By-ref-like | Example |
//! |------|------------|-------------|---------|
//! | Class | no | no | `class List<T>` |
//! | Struct | yes | no | `struct ImmutableArray<T>` |
//! | RefStruct | yes | yes | `ref struct Lock.Scope` |
//! | Interface | no | no | `interface IList<T>` |
//! | Enum | yes | no | `enum Color` |
//! | Delegate | no | no | `delegate void Action()` |

use crate::types::{MethodId, MethodInfo, PropertyId, PropertyInfo, TypeId, TypeParamId, TypeParamInfo};
use bitflags::bitflags;
use csz_common::interner::Atom;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::trace;

/// Global counter for assigning unique instance IDs to `DefinitionStore` instances.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// DefId
// =============================================================================

/// Solver-owned definition identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Struct,
    /// `ref struct`: a by-ref-like value type.
    RefStruct,
    Interface,
    Enum,
    Delegate,
}

impl DefKind {
    pub const fn is_value_type(self) -> bool {
        matches!(self, DefKind::Struct | DefKind::RefStruct | DefKind::Enum)
    }

    pub fn parse(text: &str) -> Option<DefKind> {
        Some(match text {
            "class" => DefKind::Class,
            "struct" => DefKind::Struct,
            "ref struct" => DefKind::RefStruct,
            "interface" => DefKind::Interface,
            "enum" => DefKind::Enum,
            "delegate" => DefKind::Delegate,
            _ => return None,
        })
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DefFlags: u8 {
        const ABSTRACT = 1 << 0;
        const STATIC = 1 << 1;
        const SEALED = 1 << 2;
    }
}

// =============================================================================
// Well-known types
// =============================================================================

/// Library types the core recognizes by identity rather than by lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum WellKnownType {
    IEnumerable,
    ICollection,
    IList,
    IEnumerator,
    IDisposable,
    IEnumerableT,
    IEnumeratorT,
    ICollectionT,
    IListT,
    IReadOnlyCollectionT,
    IReadOnlyListT,
    ListT,
    SpanT,
    ReadOnlySpanT,
    Lock,
    LockScope,
    Monitor,
}

impl WellKnownType {
    pub const ALL: [WellKnownType; 17] = [
        WellKnownType::IEnumerable,
        WellKnownType::ICollection,
        WellKnownType::IList,
        WellKnownType::IEnumerator,
        WellKnownType::IDisposable,
        WellKnownType::IEnumerableT,
        WellKnownType::IEnumeratorT,
        WellKnownType::ICollectionT,
        WellKnownType::IListT,
        WellKnownType::IReadOnlyCollectionT,
        WellKnownType::IReadOnlyListT,
        WellKnownType::ListT,
        WellKnownType::SpanT,
        WellKnownType::ReadOnlySpanT,
        WellKnownType::Lock,
        WellKnownType::LockScope,
        WellKnownType::Monitor,
    ];

    /// Metadata name: namespace, name and generic arity. Nested types use `+`.
    pub const fn metadata_name(self) -> (&'static str, &'static str, usize) {
        match self {
            WellKnownType::IEnumerable => ("System.Collections", "IEnumerable", 0),
            WellKnownType::ICollection => ("System.Collections", "ICollection", 0),
            WellKnownType::IList => ("System.Collections", "IList", 0),
            WellKnownType::IEnumerator => ("System.Collections", "IEnumerator", 0),
            WellKnownType::IDisposable => ("System", "IDisposable", 0),
            WellKnownType::IEnumerableT => ("System.Collections.Generic", "IEnumerable", 1),
            WellKnownType::IEnumeratorT => ("System.Collections.Generic", "IEnumerator", 1),
            WellKnownType::ICollectionT => ("System.Collections.Generic", "ICollection", 1),
            WellKnownType::IListT => ("System.Collections.Generic", "IList", 1),
            WellKnownType::IReadOnlyCollectionT => {
                ("System.Collections.Generic", "IReadOnlyCollection", 1)
            }
            WellKnownType::IReadOnlyListT => ("System.Collections.Generic", "IReadOnlyList", 1),
            WellKnownType::ListT => ("System.Collections.Generic", "List", 1),
            WellKnownType::SpanT => ("System", "Span", 1),
            WellKnownType::ReadOnlySpanT => ("System", "ReadOnlySpan", 1),
            WellKnownType::Lock => ("System.Threading", "Lock", 0),
            WellKnownType::LockScope => ("System.Threading", "Lock+Scope", 0),
            WellKnownType::Monitor => ("System.Threading", "Monitor", 0),
        }
    }

    /// Display name used in diagnostics (`System.Threading.Lock+Scope`).
    pub fn full_name(self) -> String {
        let (ns, name, _) = self.metadata_name();
        format!("{ns}.{name}")
    }

    pub fn from_metadata_name(namespace: &str, name: &str, arity: usize) -> Option<WellKnownType> {
        WellKnownType::ALL.into_iter().find(|w| {
            let (ns, n, a) = w.metadata_name();
            ns == namespace && n == name && a == arity
        })
    }

    /// The well-known collection interfaces a literal can target.
    pub const fn is_collection_interface(self) -> bool {
        matches!(
            self,
            WellKnownType::IEnumerable
                | WellKnownType::ICollection
                | WellKnownType::IList
                | WellKnownType::IEnumerableT
                | WellKnownType::IReadOnlyCollectionT
                | WellKnownType::IReadOnlyListT
                | WellKnownType::ICollectionT
                | WellKnownType::IListT
        )
    }

    /// Read-only collection interfaces (no mutating members).
    pub const fn is_read_only_interface(self) -> bool {
        matches!(
            self,
            WellKnownType::IEnumerable
                | WellKnownType::IEnumerableT
                | WellKnownType::IReadOnlyCollectionT
                | WellKnownType::IReadOnlyListT
        )
    }
}

// =============================================================================
// Definition Info
// =============================================================================

/// `[CollectionBuilder(typeof(Builder), "Create")]` on a collection type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollectionBuilderAttr {
    pub builder: DefId,
    pub method: Atom,
}

#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    pub namespace: Atom,
    pub type_params: Vec<TypeParamId>,
    /// Base class, expressed over this definition's own type parameters.
    pub base: Option<TypeId>,
    /// Directly declared interfaces, expressed over the own type parameters.
    pub interfaces: Vec<TypeId>,
    pub accessibility: crate::types::Accessibility,
    pub flags: DefFlags,
    pub containing: Option<DefId>,
    pub assembly: Atom,
    pub well_known: Option<WellKnownType>,
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyId>,
    pub collection_builder: Option<CollectionBuilderAttr>,
}

impl DefinitionInfo {
    pub fn new(kind: DefKind, namespace: Atom, name: Atom, assembly: Atom) -> Self {
        Self {
            kind,
            name,
            namespace,
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            accessibility: crate::types::Accessibility::Public,
            flags: DefFlags::empty(),
            containing: None,
            assembly,
            well_known: None,
            methods: Vec::new(),
            properties: Vec::new(),
            collection_builder: None,
        }
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(DefFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(DefFlags::STATIC)
    }
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Thread-safe storage for type definitions and their members.
pub struct DefinitionStore {
    instance_id: u64,
    definitions: DashMap<DefId, DefinitionInfo>,
    methods: DashMap<MethodId, Arc<MethodInfo>>,
    properties: DashMap<PropertyId, Arc<PropertyInfo>>,
    type_params: DashMap<TypeParamId, TypeParamInfo>,
    well_known: DashMap<WellKnownType, DefId>,
    /// Extension methods indexed by name.
    extensions: DashMap<Atom, Vec<MethodId>>,
    next_id: AtomicU32,
    next_method: AtomicU32,
    next_property: AtomicU32,
    next_type_param: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(instance_id, "DefinitionStore::new - creating new instance");
        Self {
            instance_id,
            definitions: DashMap::new(),
            methods: DashMap::new(),
            properties: DashMap::new(),
            type_params: DashMap::new(),
            well_known: DashMap::new(),
            extensions: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
            next_method: AtomicU32::new(1),
            next_property: AtomicU32::new(1),
            next_type_param: AtomicU32::new(1),
        }
    }

    /// Register a new definition and return its `DefId`.
    ///
    /// A definition tagged as well-known becomes the answer for
    /// `well_known(tag)`; the first registration wins.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = DefId(self.next_id.fetch_add(1, Ordering::SeqCst));
        trace!(
            instance_id = self.instance_id,
            def_id = %id.0,
            kind = ?info.kind,
            well_known = ?info.well_known,
            "DefinitionStore::register"
        );
        if let Some(tag) = info.well_known {
            self.well_known.entry(tag).or_insert(id);
        }
        self.definitions.insert(id, info);
        id
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.name)
    }

    pub fn get_flags(&self, id: DefId) -> DefFlags {
        self.definitions
            .get(&id)
            .map(|r| r.flags)
            .unwrap_or_default()
    }

    pub fn get_base(&self, id: DefId) -> Option<TypeId> {
        self.definitions.get(&id).and_then(|r| r.base)
    }

    pub fn get_interfaces(&self, id: DefId) -> Vec<TypeId> {
        self.definitions
            .get(&id)
            .map(|r| r.interfaces.clone())
            .unwrap_or_default()
    }

    pub fn get_type_params(&self, id: DefId) -> Vec<TypeParamId> {
        self.definitions
            .get(&id)
            .map(|r| r.type_params.clone())
            .unwrap_or_default()
    }

    pub fn get_containing(&self, id: DefId) -> Option<DefId> {
        self.definitions.get(&id).and_then(|r| r.containing)
    }

    pub fn get_well_known_tag(&self, id: DefId) -> Option<WellKnownType> {
        self.definitions.get(&id).and_then(|r| r.well_known)
    }

    pub fn get_methods(&self, id: DefId) -> Vec<MethodId> {
        self.definitions
            .get(&id)
            .map(|r| r.methods.clone())
            .unwrap_or_default()
    }

    pub fn get_properties(&self, id: DefId) -> Vec<PropertyId> {
        self.definitions
            .get(&id)
            .map(|r| r.properties.clone())
            .unwrap_or_default()
    }

    pub fn get_collection_builder(&self, id: DefId) -> Option<CollectionBuilderAttr> {
        self.definitions.get(&id).and_then(|r| r.collection_builder)
    }

    pub fn set_collection_builder(&self, id: DefId, attr: CollectionBuilderAttr) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.collection_builder = Some(attr);
        }
    }

    pub fn set_base(&self, id: DefId, base: TypeId) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.base = Some(base);
        }
    }

    pub fn add_interface(&self, id: DefId, interface: TypeId) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            if !entry.interfaces.contains(&interface) {
                entry.interfaces.push(interface);
            }
        }
    }

    pub fn set_type_params(&self, id: DefId, params: Vec<TypeParamId>) {
        if let Some(mut entry) = self.definitions.get_mut(&id) {
            entry.type_params = params;
        }
    }

    /// The definition registered for a well-known type, if the library has it.
    pub fn well_known(&self, tag: WellKnownType) -> Option<DefId> {
        self.well_known.get(&tag).map(|r| *r)
    }

    // -------------------------------------------------------------------------
    // Members
    // -------------------------------------------------------------------------

    /// Add a method to its declaring definition.
    pub fn add_method(&self, info: MethodInfo) -> MethodId {
        let id = MethodId(self.next_method.fetch_add(1, Ordering::SeqCst));
        trace!(
            instance_id = self.instance_id,
            method_id = %id.0,
            declaring = %info.declaring.0,
            kind = ?info.kind,
            "DefinitionStore::add_method"
        );
        for &tp in &info.type_params {
            if let Some(mut param) = self.type_params.get_mut(&tp) {
                param.owner = crate::types::TypeParamOwner::Method(id);
            }
        }
        if info.is_extension() {
            self.extensions.entry(info.name).or_default().push(id);
        }
        if let Some(mut entry) = self.definitions.get_mut(&info.declaring) {
            entry.methods.push(id);
        }
        self.methods.insert(id, Arc::new(info));
        id
    }

    pub fn method(&self, id: MethodId) -> Option<Arc<MethodInfo>> {
        self.methods.get(&id).map(|r| Arc::clone(&r))
    }

    pub fn add_property(&self, info: PropertyInfo) -> PropertyId {
        let id = PropertyId(self.next_property.fetch_add(1, Ordering::SeqCst));
        if let Some(mut entry) = self.definitions.get_mut(&info.declaring) {
            entry.properties.push(id);
        }
        self.properties.insert(id, Arc::new(info));
        id
    }

    pub fn property(&self, id: PropertyId) -> Option<Arc<PropertyInfo>> {
        self.properties.get(&id).map(|r| Arc::clone(&r))
    }

    /// Extension methods with the given name, in registration order.
    pub fn extension_methods(&self, name: Atom) -> Vec<MethodId> {
        self.extensions
            .get(&name)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn add_type_param(&self, info: TypeParamInfo) -> TypeParamId {
        let id = TypeParamId(self.next_type_param.fetch_add(1, Ordering::SeqCst));
        self.type_params.insert(id, info);
        id
    }

    pub fn type_param(&self, id: TypeParamId) -> Option<TypeParamInfo> {
        self.type_params.get(&id).map(|r| r.clone())
    }

    pub fn set_constraints(&self, id: TypeParamId, constraints: crate::types::TypeParamConstraints) {
        if let Some(mut entry) = self.type_params.get_mut(&id) {
            entry.constraints = constraints;
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All registered `DefId`s, sorted.
    pub fn all_ids(&self) -> Vec<DefId> {
        let mut ids: Vec<DefId> = self.definitions.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
