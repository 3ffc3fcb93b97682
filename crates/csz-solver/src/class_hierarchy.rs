//! Inheritance queries and effective member tables.
//!
//! A type's member set is flattened once into an [`EffectiveMemberTable`]:
//! own members first, then inherited members that are neither overridden nor
//! hidden. Lookups afterwards are a hash probe instead of a walk up the base
//! chain. Tables are cached per type in `SolverCaches`.
//!
//! Hiding rules:
//! - a derived method with the same signature (after substituting type
//!   arguments, method type parameters compared by position) replaces the
//!   base method; this covers both `override` and implicit hiding
//! - a derived method declared `new` hides every base method of that name
//! - properties hide by name
//! - constructors are never inherited

use crate::caches::SolverCaches;
use crate::db::TypeDatabase;
use crate::def::{DefId, DefKind, WellKnownType};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::types::{
    Accessibility, IntrinsicKind, MethodFlags, MethodId, MethodInfo, MethodKind, ParamKind,
    PropertyId, TypeArgs, TypeData, TypeId, TypeParamId,
};
use csz_common::interner::Atom;
use csz_common::language::Feature;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

// =============================================================================
// Accessibility
// =============================================================================

/// Where the analysed code sits: accessibility is judged from here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct AccessContext {
    /// Type whose body is being analysed, if any.
    pub within: Option<DefId>,
    pub assembly: Atom,
}

impl AccessContext {
    pub const fn new(within: Option<DefId>, assembly: Atom) -> Self {
        Self { within, assembly }
    }
}

/// Is a member with `accessibility`, declared on `declaring`, visible from `ctx`?
///
/// The declaring type itself (and every type containing it) must be visible too.
pub fn is_accessible(
    db: &dyn TypeDatabase,
    accessibility: Accessibility,
    declaring: DefId,
    ctx: &AccessContext,
) -> bool {
    is_type_accessible(db, declaring, ctx) && check_level(db, accessibility, declaring, ctx)
}

pub fn is_type_accessible(db: &dyn TypeDatabase, def: DefId, ctx: &AccessContext) -> bool {
    let mut current = Some(def);
    let mut steps = 0;
    while let Some(d) = current {
        let Some(info) = db.defs().get(d) else {
            return false;
        };
        match info.containing {
            Some(outer) => {
                if !check_level(db, info.accessibility, outer, ctx) {
                    return false;
                }
            }
            None => {
                // Top-level types are public or internal.
                if info.accessibility != Accessibility::Public && info.assembly != ctx.assembly {
                    return false;
                }
            }
        }
        current = info.containing;
        steps += 1;
        if steps > RecursionProfile::BaseChain.max_depth() {
            return false;
        }
    }
    true
}

fn check_level(
    db: &dyn TypeDatabase,
    accessibility: Accessibility,
    declaring: DefId,
    ctx: &AccessContext,
) -> bool {
    let internal = || db.defs().get(declaring).is_some_and(|info| info.assembly == ctx.assembly);
    let private = || ctx.within.is_some_and(|w| enclosing_types(db, w).contains(&declaring));
    let protected = || {
        ctx.within.is_some_and(|w| {
            enclosing_types(db, w)
                .into_iter()
                .any(|outer| outer == declaring || derives_from(db, outer, declaring))
        })
    };
    match accessibility {
        Accessibility::Public => true,
        Accessibility::Private => private(),
        Accessibility::Internal => internal(),
        Accessibility::Protected => protected(),
        Accessibility::ProtectedInternal => internal() || protected(),
        Accessibility::PrivateProtected => internal() && protected(),
    }
}

/// `def` followed by the types lexically containing it.
fn enclosing_types(db: &dyn TypeDatabase, def: DefId) -> SmallVec<[DefId; 4]> {
    let mut out = SmallVec::new();
    let mut current = Some(def);
    while let Some(d) = current {
        if out.contains(&d) || out.len() as u32 >= RecursionProfile::BaseChain.max_depth() {
            break;
        }
        out.push(d);
        current = db.defs().get_containing(d);
    }
    out
}

/// Does `def` (transitively) derive from the class `base`?
pub fn derives_from(db: &dyn TypeDatabase, def: DefId, base: DefId) -> bool {
    let mut guard: RecursionGuard<DefId> = RecursionGuard::with_profile(RecursionProfile::BaseChain);
    let mut entered = Vec::new();
    let mut current = db.defs().get_base(def).and_then(|b| db.def_of(b));
    let mut found = false;
    while let Some(d) = current {
        if d == base {
            found = true;
            break;
        }
        if !guard.enter(d).is_entered() {
            break;
        }
        entered.push(d);
        current = db.defs().get_base(d).and_then(|b| db.def_of(b));
    }
    for d in entered.into_iter().rev() {
        guard.leave(d);
    }
    found
}

// =============================================================================
// Type categories
// =============================================================================

pub fn is_reference_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Intrinsic(kind)) => kind.is_reference_type(),
        Some(TypeData::Named { def, .. }) => db
            .defs()
            .get_kind(def)
            .is_some_and(|k| matches!(k, DefKind::Class | DefKind::Interface | DefKind::Delegate)),
        Some(TypeData::Array { .. }) => true,
        Some(TypeData::NullableRef(inner)) => is_reference_type(db, inner),
        Some(TypeData::TypeParameter(param)) => db.defs().type_param(param).is_some_and(|info| {
            info.constraints.reference_type
                || info
                    .constraints
                    .types
                    .iter()
                    .any(|&c| is_class_type(db, c))
        }),
        _ => false,
    }
}

pub fn is_value_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Intrinsic(kind)) => kind.is_value_type(),
        Some(TypeData::Named { def, .. }) => {
            db.defs().get_kind(def).is_some_and(DefKind::is_value_type)
        }
        Some(TypeData::Nullable(_)) => true,
        Some(TypeData::TypeParameter(param)) => db
            .defs()
            .type_param(param)
            .is_some_and(|info| info.constraints.value_type),
        _ => false,
    }
}

/// By-ref-like (`ref struct`) types.
pub fn is_ref_like(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Named { def, .. }) => db.defs().get_kind(def) == Some(DefKind::RefStruct),
        _ => false,
    }
}

fn is_class_type(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    match db.lookup(ty) {
        Some(TypeData::Named { def, .. }) => db.defs().get_kind(def) == Some(DefKind::Class),
        Some(TypeData::Intrinsic(IntrinsicKind::String)) => true,
        _ => false,
    }
}

/// Strip the advisory nullable-reference annotation.
pub fn strip_nullable_ref(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    match db.lookup(ty) {
        Some(TypeData::NullableRef(inner)) => inner,
        _ => ty,
    }
}

// =============================================================================
// Base chain and interfaces
// =============================================================================

/// Direct base type, with type arguments substituted.
///
/// Classes without a declared base, structs and enums derive from `object`;
/// interfaces and `object` itself have no base. A type parameter's base is its
/// class constraint, else `object`.
pub fn base_type_of(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeId> {
    match db.lookup(ty)? {
        TypeData::Intrinsic(kind) => match kind {
            IntrinsicKind::Object
            | IntrinsicKind::Dynamic
            | IntrinsicKind::Void
            | IntrinsicKind::Error
            | IntrinsicKind::Null => None,
            _ => Some(TypeId::OBJECT),
        },
        TypeData::Named { def, .. } => {
            let kind = db.defs().get_kind(def)?;
            if kind == DefKind::Interface {
                return None;
            }
            match db.defs().get_base(def) {
                Some(base) => {
                    let subst = TypeSubstitution::for_type(db, ty);
                    Some(instantiate_type(db, base, &subst))
                }
                None => Some(TypeId::OBJECT),
            }
        }
        TypeData::Array { .. } | TypeData::Nullable(_) => Some(TypeId::OBJECT),
        TypeData::NullableRef(inner) => base_type_of(db, inner),
        TypeData::TypeParameter(param) => {
            let info = db.defs().type_param(param)?;
            let class = info.constraints.types.iter().copied().find(|&c| is_class_type(db, c));
            Some(class.unwrap_or(TypeId::OBJECT))
        }
        TypeData::Pointer(_) | TypeData::FunctionPointer { .. } => None,
    }
}

/// Base types from the direct base up to (and including) `object`.
pub fn base_chain(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let mut guard: RecursionGuard<TypeId> = RecursionGuard::with_profile(RecursionProfile::BaseChain);
    let mut chain = Vec::new();
    let mut current = base_type_of(db, ty);
    while let Some(base) = current {
        if !guard.enter(base).is_entered() {
            trace!(ty = ty.0, at = base.0, "base chain cut (cycle or depth)");
            break;
        }
        chain.push(base);
        current = base_type_of(db, base);
    }
    for &base in chain.iter().rev() {
        guard.leave(base);
    }
    chain
}

/// Interfaces a type declares directly (substituted), plus the built-in
/// interfaces of arrays and `string`.
pub fn direct_interfaces(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    match db.lookup(ty) {
        Some(TypeData::Named { def, .. }) => {
            let subst = TypeSubstitution::for_type(db, ty);
            db.defs()
                .get_interfaces(def)
                .into_iter()
                .map(|i| instantiate_type(db, i, &subst))
                .collect()
        }
        Some(TypeData::Array { element, rank }) => {
            let mut out = Vec::new();
            if rank == 1 {
                for tag in [WellKnownType::IListT, WellKnownType::IReadOnlyListT] {
                    out.extend(db.well_known_type(tag, &[element]));
                }
            }
            out.extend(db.well_known_type(WellKnownType::IList, &[]));
            out
        }
        Some(TypeData::Intrinsic(IntrinsicKind::String)) => {
            let mut out = Vec::new();
            out.extend(db.well_known_type(WellKnownType::IEnumerableT, &[TypeId::CHAR]));
            out.extend(db.well_known_type(WellKnownType::IEnumerable, &[]));
            out
        }
        Some(TypeData::TypeParameter(param)) => db
            .defs()
            .type_param(param)
            .map(|info| {
                info.constraints
                    .types
                    .into_iter()
                    .filter(|&c| {
                        db.def_of(c).and_then(|d| db.defs().get_kind(d))
                            == Some(DefKind::Interface)
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Some(TypeData::NullableRef(inner)) => direct_interfaces(db, inner),
        _ => Vec::new(),
    }
}

/// Every interface `ty` implements, transitively, in breadth-first
/// declaration order. Does not include `ty` itself.
pub fn all_interfaces(db: &dyn TypeDatabase, ty: TypeId) -> Vec<TypeId> {
    let mut seen: IndexSet<TypeId> = IndexSet::new();
    let mut queue: VecDeque<TypeId> = VecDeque::new();
    queue.extend(direct_interfaces(db, ty));
    for base in base_chain(db, ty) {
        queue.extend(direct_interfaces(db, base));
    }
    let limit = RecursionProfile::BaseChain.max_iterations() as usize;
    while let Some(iface) = queue.pop_front() {
        if iface == ty || !seen.insert(iface) {
            continue;
        }
        if seen.len() >= limit {
            break;
        }
        queue.extend(direct_interfaces(db, iface));
    }
    seen.into_iter().collect()
}

pub fn implements_interface(db: &dyn TypeDatabase, ty: TypeId, iface: TypeId) -> bool {
    ty == iface || all_interfaces(db, ty).contains(&iface)
}

/// Instantiations of a well-known generic interface among `ty` and its
/// interfaces (`IEnumerable<int>` and `IEnumerable<string>` for a type that
/// implements both).
pub fn find_interface_instantiations(
    db: &dyn TypeDatabase,
    ty: TypeId,
    tag: WellKnownType,
) -> Vec<TypeId> {
    let Some(target_def) = db.defs().well_known(tag) else {
        return Vec::new();
    };
    std::iter::once(ty)
        .chain(all_interfaces(db, ty))
        .filter(|&i| db.def_of(i) == Some(target_def))
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Resolved members
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedParam {
    pub ty: TypeId,
    pub kind: ParamKind,
    pub by_ref: bool,
}

/// A method as seen through a particular constructed type.
///
/// Parameter and return types have the declaring type's arguments (and, once
/// inferred, the method's own type arguments) substituted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedMethod {
    pub id: MethodId,
    pub name: Atom,
    pub declaring_type: TypeId,
    pub params: SmallVec<[ResolvedParam; 4]>,
    pub return_type: TypeId,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_extension: bool,
    pub is_explicit_impl: bool,
    pub generic_arity: usize,
    /// Inferred method type arguments; empty until inference ran.
    pub type_args: TypeArgs,
    /// Position in the inheritance chain: 0 for members of the type itself.
    pub depth: u32,
    pub required_feature: Option<Feature>,
}

impl ResolvedMethod {
    pub fn new(
        db: &dyn TypeDatabase,
        id: MethodId,
        declaring_type: TypeId,
        depth: u32,
    ) -> Option<ResolvedMethod> {
        let info = db.defs().method(id)?;
        let subst = TypeSubstitution::for_type(db, declaring_type);
        Some(Self::build(db, id, &info, declaring_type, depth, &subst, TypeArgs::new()))
    }

    /// Substitute inferred method type arguments.
    pub fn with_type_args(&self, db: &dyn TypeDatabase, type_args: &[TypeId]) -> Option<ResolvedMethod> {
        let info = db.defs().method(self.id)?;
        let mut subst = TypeSubstitution::for_type(db, self.declaring_type);
        subst.extend(&TypeSubstitution::from_pairs(&info.type_params, type_args));
        Some(Self::build(
            db,
            self.id,
            &info,
            self.declaring_type,
            self.depth,
            &subst,
            TypeArgs::from_slice(type_args),
        ))
    }

    fn build(
        db: &dyn TypeDatabase,
        id: MethodId,
        info: &MethodInfo,
        declaring_type: TypeId,
        depth: u32,
        subst: &TypeSubstitution,
        type_args: TypeArgs,
    ) -> ResolvedMethod {
        ResolvedMethod {
            id,
            name: info.name,
            declaring_type,
            params: info
                .params
                .iter()
                .map(|p| ResolvedParam {
                    ty: instantiate_type(db, p.ty, subst),
                    kind: p.kind,
                    by_ref: p.by_ref,
                })
                .collect(),
            return_type: instantiate_type(db, info.return_type, subst),
            accessibility: info.accessibility,
            is_static: info.is_static(),
            is_extension: info.is_extension(),
            is_explicit_impl: info.flags.contains(MethodFlags::EXPLICIT_INTERFACE_IMPL),
            generic_arity: info.generic_arity(),
            type_args,
            depth,
            required_feature: info.required_feature,
        }
    }

    pub fn required_param_count(&self) -> usize {
        self.params.iter().filter(|p| p.kind == ParamKind::Normal).count()
    }

    /// Parameters after the `this` receiver of an extension method.
    pub fn call_params(&self) -> &[ResolvedParam] {
        if self.is_extension && !self.params.is_empty() {
            &self.params[1..]
        } else {
            &self.params
        }
    }
}

// =============================================================================
// Effective member table
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemberEntry {
    pub method: MethodId,
    /// The constructed type in the chain that declares the member.
    pub declaring_type: TypeId,
    pub depth: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyEntry {
    pub property: PropertyId,
    pub declaring_type: TypeId,
    pub depth: u32,
}

impl PropertyEntry {
    /// Property type with the declaring type's arguments substituted.
    pub fn resolved_type(&self, db: &dyn TypeDatabase) -> Option<TypeId> {
        let info = db.defs().property(self.property)?;
        let subst = TypeSubstitution::for_type(db, self.declaring_type);
        Some(instantiate_type(db, info.ty, &subst))
    }
}

#[derive(Clone, Debug, Default)]
pub struct EffectiveMemberTable {
    methods: FxHashMap<Atom, SmallVec<[MemberEntry; 4]>>,
    properties: FxHashMap<Atom, SmallVec<[PropertyEntry; 2]>>,
}

impl EffectiveMemberTable {
    pub fn methods(&self, name: Atom) -> &[MemberEntry] {
        self.methods.get(&name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn properties(&self, name: Atom) -> &[PropertyEntry] {
        self.properties.get(&name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn method_count(&self) -> usize {
        self.methods.values().map(SmallVec::len).sum()
    }
}

type SignatureKey = SmallVec<[(TypeId, bool); 4]>;

struct TableBuilder<'a> {
    db: &'a dyn TypeDatabase,
    table: EffectiveMemberTable,
    /// (name, signature, generic arity, depth, declared `new`) of every kept method.
    kept: Vec<(Atom, SignatureKey, usize, u32, bool)>,
}

impl<'a> TableBuilder<'a> {
    fn add_type(&mut self, owner: TypeId, depth: u32) {
        let Some(def) = self.db.def_of(owner) else {
            return;
        };
        let subst = TypeSubstitution::for_type(self.db, owner);
        for id in self.db.defs().get_methods(def) {
            let Some(info) = self.db.defs().method(id) else {
                continue;
            };
            match info.kind {
                MethodKind::Conversion { .. } => continue,
                MethodKind::Constructor if depth > 0 => continue,
                _ => {}
            }
            let sig = self.signature(&info, &subst);
            let arity = info.generic_arity();
            let hidden = self.kept.iter().any(|(name, kept_sig, kept_arity, kept_depth, is_new)| {
                *name == info.name
                    && *kept_depth < depth
                    && (*is_new || (*kept_arity == arity && *kept_sig == sig))
            });
            if hidden {
                continue;
            }
            self.kept.push((info.name, sig, arity, depth, info.flags.contains(MethodFlags::NEW)));
            self.table.methods.entry(info.name).or_default().push(MemberEntry {
                method: id,
                declaring_type: owner,
                depth,
            });
        }
        for id in self.db.defs().get_properties(def) {
            let Some(info) = self.db.defs().property(id) else {
                continue;
            };
            let entries = self.table.properties.entry(info.name).or_default();
            if entries.iter().any(|e| e.depth < depth) {
                continue;
            }
            entries.push(PropertyEntry {
                property: id,
                declaring_type: owner,
                depth,
            });
        }
    }

    fn signature(&self, info: &MethodInfo, owner_subst: &TypeSubstitution) -> SignatureKey {
        let mut subst = owner_subst.clone();
        for (index, &tp) in info.type_params.iter().enumerate() {
            subst.insert(tp, canonical_method_param(self.db, index));
        }
        info.params
            .iter()
            .map(|p| (instantiate_type(self.db, p.ty, &subst), p.by_ref))
            .collect()
    }
}

/// Stand-in for "the method's n-th type parameter" when comparing signatures.
fn canonical_method_param(db: &dyn TypeDatabase, index: usize) -> TypeId {
    db.type_param_type(TypeParamId(u32::MAX - index as u32))
}

/// Flatten the members visible through `ty`.
pub fn build_member_table(db: &dyn TypeDatabase, ty: TypeId) -> EffectiveMemberTable {
    let ty = strip_nullable_ref(db, ty);
    let mut builder = TableBuilder {
        db,
        table: EffectiveMemberTable::default(),
        kept: Vec::new(),
    };

    let is_interface = db
        .def_of(ty)
        .and_then(|d| db.defs().get_kind(d))
        .is_some_and(|k| k == DefKind::Interface);
    let is_type_param = matches!(db.lookup(ty), Some(TypeData::TypeParameter(_)));

    let mut chain = vec![ty];
    chain.extend(base_chain(db, ty));
    if is_interface || is_type_param {
        chain.extend(all_interfaces(db, ty));
    }
    for (depth, owner) in chain.into_iter().enumerate() {
        builder.add_type(owner, depth as u32);
    }
    trace!(
        ty = ty.0,
        methods = builder.table.method_count(),
        "built effective member table"
    );
    builder.table
}

/// Cached member table for `ty`.
pub fn member_table(
    db: &dyn TypeDatabase,
    caches: &SolverCaches,
    ty: TypeId,
) -> Arc<EffectiveMemberTable> {
    caches.member_table(ty, || build_member_table(db, ty))
}

#[cfg(test)]
#[path = "../tests/class_hierarchy_tests.rs"]
mod tests;
