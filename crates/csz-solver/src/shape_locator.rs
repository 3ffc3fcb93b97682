//! Shape Locator: structural (duck-typed) protocol lookup.
//!
//! Collection literals and lock statements bind to members by name and
//! shape rather than by interface identity:
//!
//! | Protocol | Members | Used by |
//! |----------|---------|---------|
//! | `EnumeratorProducer` | `GetEnumerator()` + `MoveNext()` + `Current` | constructibility, spreads |
//! | `Adder` | every applicable `Add(...)` | collection literals, initializers |
//! | `ScopeProducer` | `EnterScope()` returning a ref struct | lock statements |
//! | `ScopeDisposer` | `Dispose()` on that ref struct | lock statements |
//!
//! A failed lookup is data (`NotFound` / `Ambiguous`), never a diagnostic:
//! the lock binder falls back to the monitor pattern on `NotFound`.
//!
//! Results are memoized per `(type, protocol, access context)`. Analysis
//! options (the defined `[Conditional]` symbols) are fixed for a compilation,
//! so they are not part of the key.

use crate::caches::SolverCaches;
use crate::class_hierarchy::{
    AccessContext, ResolvedMethod, find_interface_instantiations, implements_interface,
    is_accessible, is_ref_like, member_table, strip_nullable_ref,
};
use crate::conversions::ConversionClassifier;
use crate::db::TypeDatabase;
use crate::def::WellKnownType;
use crate::overload::bind_extension_receiver;
use crate::types::{
    Accessibility, IntrinsicKind, MethodInfo, MethodKind, ParamKind, TypeData, TypeId,
};
use csz_common::options::AnalysisOptions;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolKind {
    EnumeratorProducer,
    Adder,
    ScopeProducer,
    ScopeDisposer,
}

impl ProtocolKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::EnumeratorProducer => "enumerator_producer",
            ProtocolKind::Adder => "adder",
            ProtocolKind::ScopeProducer => "scope_producer",
            ProtocolKind::ScopeDisposer => "scope_disposer",
        }
    }
}

/// Where an enumerator shape came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EnumeratorSource {
    /// Arrays, spans and `string`.
    BuiltIn,
    /// A public `GetEnumerator()` found by name.
    Pattern,
    /// The unique implemented `IEnumerable<T>`.
    GenericInterface,
    /// Non-generic `IEnumerable`.
    NonGenericInterface,
    /// An extension `GetEnumerator(this T)`.
    Extension,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumeratorShape {
    pub source: EnumeratorSource,
    /// `None` for built-in enumerables.
    pub get_enumerator: Option<ResolvedMethod>,
    pub move_next: Option<ResolvedMethod>,
    pub enumerator_type: Option<TypeId>,
    /// Type of `Current`.
    pub iteration_type: TypeId,
    /// The enumerator is statically known to implement `IDisposable`.
    pub needs_disposal: bool,
}

impl EnumeratorShape {
    fn built_in(iteration_type: TypeId) -> Self {
        Self {
            source: EnumeratorSource::BuiltIn,
            get_enumerator: None,
            move_next: None,
            enumerator_type: None,
            iteration_type,
            needs_disposal: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeMatch {
    /// Scope producer or scope disposer.
    Method(ResolvedMethod),
    Enumerator(EnumeratorShape),
    /// Adder candidate set; overload resolution picks per element.
    Adders(Arc<[ResolvedMethod]>),
}

/// One of several competing answers to a shape query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeCandidate {
    Method(ResolvedMethod),
    /// An implemented interface (`IEnumerable<int>` next to `IEnumerable<string>`).
    Interface(TypeId),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeQueryResult {
    Found(ShapeMatch),
    NotFound,
    Ambiguous(Vec<ShapeCandidate>),
}

impl ShapeQueryResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ShapeQueryResult::Found(_))
    }

    pub fn as_method(&self) -> Option<&ResolvedMethod> {
        match self {
            ShapeQueryResult::Found(ShapeMatch::Method(method)) => Some(method),
            _ => None,
        }
    }

    pub fn as_enumerator(&self) -> Option<&EnumeratorShape> {
        match self {
            ShapeQueryResult::Found(ShapeMatch::Enumerator(shape)) => Some(shape),
            _ => None,
        }
    }

    pub fn as_adders(&self) -> Option<&Arc<[ResolvedMethod]>> {
        match self {
            ShapeQueryResult::Found(ShapeMatch::Adders(adders)) => Some(adders),
            _ => None,
        }
    }

    pub fn outcome_str(&self) -> &'static str {
        match self {
            ShapeQueryResult::Found(_) => "found",
            ShapeQueryResult::NotFound => "not_found",
            ShapeQueryResult::Ambiguous(_) => "ambiguous",
        }
    }
}

pub struct ShapeLocator<'a> {
    db: &'a dyn TypeDatabase,
    caches: &'a SolverCaches,
    access: AccessContext,
    options: &'a AnalysisOptions,
}

impl<'a> ShapeLocator<'a> {
    pub fn new(
        db: &'a dyn TypeDatabase,
        caches: &'a SolverCaches,
        access: AccessContext,
        options: &'a AnalysisOptions,
    ) -> Self {
        Self {
            db,
            caches,
            access,
            options,
        }
    }

    pub fn access(&self) -> &AccessContext {
        &self.access
    }

    pub fn db(&self) -> &'a dyn TypeDatabase {
        self.db
    }

    pub fn caches(&self) -> &'a SolverCaches {
        self.caches
    }

    pub fn options(&self) -> &'a AnalysisOptions {
        self.options
    }

    pub fn locate(&self, ty: TypeId, kind: ProtocolKind) -> ShapeQueryResult {
        let ty = strip_nullable_ref(self.db, ty);
        self.caches.shape((ty, kind, self.access), || {
            let result = match kind {
                ProtocolKind::EnumeratorProducer => self.locate_enumerator(ty),
                ProtocolKind::Adder => self.locate_adders(ty),
                ProtocolKind::ScopeProducer => self.locate_scope_producer(ty),
                ProtocolKind::ScopeDisposer => self.locate_scope_disposer(ty),
            };
            debug!(
                ty = ty.0,
                protocol = kind.as_str(),
                outcome = result.outcome_str(),
                "located shape"
            );
            result
        })
    }

    fn method_accessible(&self, info: &MethodInfo) -> bool {
        is_accessible(self.db, info.accessibility, info.declaring, &self.access)
    }

    // -------------------------------------------------------------------------
    // Enumerator
    // -------------------------------------------------------------------------

    fn locate_enumerator(&self, ty: TypeId) -> ShapeQueryResult {
        let db = self.db;
        match db.lookup(ty) {
            Some(TypeData::Array { element, .. }) => {
                return ShapeQueryResult::Found(ShapeMatch::Enumerator(EnumeratorShape::built_in(
                    element,
                )));
            }
            Some(TypeData::Intrinsic(IntrinsicKind::String)) => {
                return ShapeQueryResult::Found(ShapeMatch::Enumerator(EnumeratorShape::built_in(
                    TypeId::CHAR,
                )));
            }
            None | Some(TypeData::Pointer(_) | TypeData::FunctionPointer { .. }) => {
                return ShapeQueryResult::NotFound;
            }
            _ => {}
        }
        if let Some((WellKnownType::SpanT | WellKnownType::ReadOnlySpanT, args)) =
            db.well_known_of(ty)
        {
            if let Some(&element) = args.first() {
                return ShapeQueryResult::Found(ShapeMatch::Enumerator(EnumeratorShape::built_in(
                    element,
                )));
            }
        }

        if let Some(result) = self.enumerator_pattern(ty) {
            return result;
        }

        let generic = find_interface_instantiations(db, ty, WellKnownType::IEnumerableT);
        match generic.as_slice() {
            [iface] => {
                let shape = self.interface_enumerator(*iface, EnumeratorSource::GenericInterface);
                if let Some(shape) = shape {
                    return ShapeQueryResult::Found(ShapeMatch::Enumerator(shape));
                }
            }
            [] => {}
            many => {
                trace!(ty = ty.0, count = many.len(), "multiple IEnumerable<T> implementations");
                return ShapeQueryResult::Ambiguous(
                    many.iter().map(|&i| ShapeCandidate::Interface(i)).collect(),
                );
            }
        }

        if let Some(nongeneric) = db.well_known_type(WellKnownType::IEnumerable, &[]) {
            if implements_interface(db, ty, nongeneric) {
                if let Some(shape) =
                    self.interface_enumerator(nongeneric, EnumeratorSource::NonGenericInterface)
                {
                    return ShapeQueryResult::Found(ShapeMatch::Enumerator(shape));
                }
            }
        }

        self.enumerator_extension(ty)
    }

    /// `GetEnumerator()` found by name. `None` means "no pattern candidate,
    /// keep looking at interfaces".
    fn enumerator_pattern(&self, ty: TypeId) -> Option<ShapeQueryResult> {
        let db = self.db;
        let name = db.atom("GetEnumerator");
        let table = member_table(db, self.caches, ty);
        let candidates: Vec<ResolvedMethod> = table
            .methods(name)
            .iter()
            .filter_map(|entry| {
                let info = db.defs().method(entry.method)?;
                let usable = !info.is_static()
                    && info.kind == MethodKind::Ordinary
                    && info.generic_arity() == 0
                    && info.required_param_count() == 0
                    && self.method_accessible(&info)
                    && info.accessibility == Accessibility::Public;
                if !usable {
                    return None;
                }
                ResolvedMethod::new(db, entry.method, entry.declaring_type, entry.depth)
            })
            .collect();
        let [get_enumerator] = candidates.as_slice() else {
            if candidates.len() > 1 {
                trace!(ty = ty.0, "ambiguous GetEnumerator pattern, trying interfaces");
            }
            return None;
        };
        Some(match self.validate_enumerator(get_enumerator, EnumeratorSource::Pattern) {
            Some(shape) => ShapeQueryResult::Found(ShapeMatch::Enumerator(shape)),
            None => ShapeQueryResult::NotFound,
        })
    }

    fn interface_enumerator(
        &self,
        iface: TypeId,
        source: EnumeratorSource,
    ) -> Option<EnumeratorShape> {
        let db = self.db;
        let def = db.def_of(iface)?;
        let name = db.atom("GetEnumerator");
        let id = db.defs().get_methods(def).into_iter().find(|&m| {
            db.defs()
                .method(m)
                .is_some_and(|info| info.name == name && info.params.is_empty())
        })?;
        let method = ResolvedMethod::new(db, id, iface, 0)?;
        self.validate_enumerator(&method, source)
    }

    fn enumerator_extension(&self, ty: TypeId) -> ShapeQueryResult {
        let db = self.db;
        let classifier = ConversionClassifier::new(db);
        let name = db.atom("GetEnumerator");
        let candidates: Vec<ResolvedMethod> = db
            .defs()
            .extension_methods(name)
            .into_iter()
            .filter_map(|id| {
                let info = db.defs().method(id)?;
                if info.params.len() != 1 || !self.method_accessible(&info) {
                    return None;
                }
                let declaring = db.named(info.declaring, &[]);
                let method = ResolvedMethod::new(db, id, declaring, 0)?;
                bind_extension_receiver(&classifier, &method, ty)
            })
            .filter(|m| m.type_args.len() == m.generic_arity)
            .collect();
        match candidates.as_slice() {
            [] => ShapeQueryResult::NotFound,
            [only] => match self.validate_enumerator(only, EnumeratorSource::Extension) {
                Some(shape) => ShapeQueryResult::Found(ShapeMatch::Enumerator(shape)),
                None => ShapeQueryResult::NotFound,
            },
            many => ShapeQueryResult::Ambiguous(
                many.iter().cloned().map(ShapeCandidate::Method).collect(),
            ),
        }
    }

    /// The enumerator type needs `bool MoveNext()` and a readable `Current`.
    fn validate_enumerator(
        &self,
        get_enumerator: &ResolvedMethod,
        source: EnumeratorSource,
    ) -> Option<EnumeratorShape> {
        let db = self.db;
        let enumerator = strip_nullable_ref(db, get_enumerator.return_type);
        let table = member_table(db, self.caches, enumerator);

        let move_next = table.methods(db.atom("MoveNext")).iter().find_map(|entry| {
            let info = db.defs().method(entry.method)?;
            let ok = !info.is_static()
                && info.params.is_empty()
                && info.generic_arity() == 0
                && info.return_type == TypeId::BOOL
                && self.method_accessible(&info);
            if !ok {
                return None;
            }
            ResolvedMethod::new(db, entry.method, entry.declaring_type, entry.depth)
        })?;

        let current = table.properties(db.atom("Current")).iter().find_map(|entry| {
            let info = db.defs().property(entry.property)?;
            let ok = !info.is_static
                && info.has_getter
                && is_accessible(db, info.accessibility, info.declaring, &self.access);
            if !ok {
                return None;
            }
            entry.resolved_type(db)
        })?;

        let needs_disposal = db
            .well_known_type(WellKnownType::IDisposable, &[])
            .is_some_and(|disposable| implements_interface(db, enumerator, disposable));
        Some(EnumeratorShape {
            source,
            get_enumerator: Some(get_enumerator.clone()),
            move_next: Some(move_next),
            enumerator_type: Some(enumerator),
            iteration_type: current,
            needs_disposal,
        })
    }

    // -------------------------------------------------------------------------
    // Adders
    // -------------------------------------------------------------------------

    fn adder_shape_ok(&self, info: &MethodInfo, receiver_slots: usize) -> bool {
        let element_slot_ok = info.params.len() > receiver_slots
            && info.params[receiver_slots + 1..]
                .iter()
                .all(|p| p.kind != ParamKind::Normal)
            && !info.params[receiver_slots].by_ref;
        let conditional_ok = match info.conditional {
            Some(symbol) => self.options.is_symbol_defined(&self.db.resolve_atom(symbol)),
            None => true,
        };
        element_slot_ok && conditional_ok && self.method_accessible(info)
    }

    fn locate_adders(&self, ty: TypeId) -> ShapeQueryResult {
        let db = self.db;
        let name = db.atom("Add");
        let table = member_table(db, self.caches, ty);
        let mut adders: Vec<ResolvedMethod> = table
            .methods(name)
            .iter()
            .filter_map(|entry| {
                let info = db.defs().method(entry.method)?;
                let instance = !info.is_static()
                    && info.kind == MethodKind::Ordinary
                    && info.explicit_interface.is_none();
                if !instance || !self.adder_shape_ok(&info, 0) {
                    return None;
                }
                ResolvedMethod::new(db, entry.method, entry.declaring_type, entry.depth)
            })
            .collect();

        let classifier = ConversionClassifier::new(db);
        for id in db.defs().extension_methods(name) {
            let Some(info) = db.defs().method(id) else {
                continue;
            };
            if !self.adder_shape_ok(&info, 1) {
                continue;
            }
            let declaring = db.named(info.declaring, &[]);
            let bound = ResolvedMethod::new(db, id, declaring, 0)
                .and_then(|m| bind_extension_receiver(&classifier, &m, ty));
            if let Some(method) = bound {
                if !adders.contains(&method) {
                    adders.push(method);
                }
            }
        }

        trace!(ty = ty.0, count = adders.len(), "adder candidates");
        if adders.is_empty() {
            ShapeQueryResult::NotFound
        } else {
            ShapeQueryResult::Found(ShapeMatch::Adders(adders.into()))
        }
    }

    // -------------------------------------------------------------------------
    // Lock scope
    // -------------------------------------------------------------------------

    fn locate_scope_producer(&self, ty: TypeId) -> ShapeQueryResult {
        let db = self.db;
        let table = member_table(db, self.caches, ty);
        let entries = table.methods(db.atom("EnterScope"));
        // Every most-derived declaration counts, including explicit
        // implementations and generic overloads.
        let [entry] = entries else {
            trace!(ty = ty.0, count = entries.len(), "EnterScope is not a single candidate");
            return ShapeQueryResult::NotFound;
        };
        let Some(info) = db.defs().method(entry.method) else {
            return ShapeQueryResult::NotFound;
        };
        let Some(method) = ResolvedMethod::new(db, entry.method, entry.declaring_type, entry.depth)
        else {
            return ShapeQueryResult::NotFound;
        };
        let valid = info.kind == MethodKind::Ordinary
            && !method.is_static
            && !method.is_explicit_impl
            && method.generic_arity == 0
            && method.required_param_count() == 0
            && self.method_accessible(&info)
            && is_ref_like(db, method.return_type);
        if valid {
            ShapeQueryResult::Found(ShapeMatch::Method(method))
        } else {
            ShapeQueryResult::NotFound
        }
    }

    fn locate_scope_disposer(&self, ty: TypeId) -> ShapeQueryResult {
        let db = self.db;
        let Some(def) = db.def_of(ty) else {
            return ShapeQueryResult::NotFound;
        };
        if !is_ref_like(db, ty) {
            return ShapeQueryResult::NotFound;
        }
        let name = db.atom("Dispose");
        let declared: Vec<_> = db
            .defs()
            .get_methods(def)
            .into_iter()
            .filter(|&id| db.defs().method(id).is_some_and(|info| info.name == name))
            .collect();
        let [id] = declared.as_slice() else {
            return ShapeQueryResult::NotFound;
        };
        let Some(info) = db.defs().method(*id) else {
            return ShapeQueryResult::NotFound;
        };
        let valid = !info.is_static()
            && info.kind == MethodKind::Ordinary
            && info.generic_arity() == 0
            && info.params.is_empty()
            && info.return_type == TypeId::VOID
            && self.method_accessible(&info);
        match ResolvedMethod::new(db, *id, ty, 0) {
            Some(method) if valid => ShapeQueryResult::Found(ShapeMatch::Method(method)),
            _ => ShapeQueryResult::NotFound,
        }
    }
}

#[cfg(test)]
#[path = "../tests/shape_locator_tests.rs"]
mod tests;
