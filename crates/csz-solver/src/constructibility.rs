//! Constructibility Classifier: can a collection literal build this type,
//! and how?
//!
//! Checked in order:
//!
//! 1. single-rank arrays;
//! 2. `Span<T>` / `ReadOnlySpan<T>`;
//! 3. the well-known collection interfaces, backed by `List<T>`;
//! 4. types carrying `[CollectionBuilder]`, built by a static
//!    `Create(ReadOnlySpan<T>)` on the builder type;
//! 5. everything else, as a user-defined collection: restricted kinds and
//!    abstract types are rejected, then the `IEnumerable` marker, the
//!    enumerator shape and a zero-argument constructor are required.
//!
//! The verdict is a pure function of the target type and access context and
//! is cached in [`SolverCaches`].

use crate::caches::SolverCaches;
use crate::class_hierarchy::{
    ResolvedMethod, implements_interface, is_accessible, is_value_type, strip_nullable_ref,
};
use crate::db::TypeDatabase;
use crate::def::{CollectionBuilderAttr, DefFlags, DefId, DefKind, WellKnownType};
use crate::shape_locator::{ProtocolKind, ShapeLocator};
use crate::types::{MethodKind, ParamKind, TypeData, TypeId, TypeParamId};
use crate::well_known::{WellKnownMember, lookup_member};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NotConstructibleReason {
    NoParameterlessConstructor,
    NoEnumerablePattern,
    RestrictedType,
    MissingWellKnownMember(WellKnownMember),
    MissingDefaultType(WellKnownType),
    Abstract,
    Inaccessible,
    /// A builder-attributed type without an enumerator shape.
    NoBuilderElementType,
    /// No static `Create(.., ReadOnlySpan<element>)` returning the target.
    BuilderMethodNotFound(TypeId),
}

impl NotConstructibleReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            NotConstructibleReason::NoParameterlessConstructor => "no_parameterless_constructor",
            NotConstructibleReason::NoEnumerablePattern => "no_enumerable_pattern",
            NotConstructibleReason::RestrictedType => "restricted_type",
            NotConstructibleReason::MissingWellKnownMember(_) => "missing_well_known_member",
            NotConstructibleReason::MissingDefaultType(_) => "missing_default_type",
            NotConstructibleReason::Abstract => "abstract",
            NotConstructibleReason::Inaccessible => "inaccessible",
            NotConstructibleReason::NoBuilderElementType => "no_builder_element_type",
            NotConstructibleReason::BuilderMethodNotFound(_) => "builder_method_not_found",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstructibilityVerdict {
    NotConstructible(NotConstructibleReason),
    Array {
        element: TypeId,
        rank: u8,
    },
    Span {
        span_type: TypeId,
        element: TypeId,
        readonly: bool,
        /// `ctor(T[])` on the span type.
        constructor: ResolvedMethod,
    },
    InterfaceBackedByDefault {
        interface: TypeId,
        element: TypeId,
        /// `List<element>`.
        concrete: TypeId,
        constructor: ResolvedMethod,
        adders: Arc<[ResolvedMethod]>,
    },
    UserDefinedCollection {
        concrete: TypeId,
        element: TypeId,
        /// `None` for the implicit parameterless constructor (structs,
        /// classes without declared constructors, `new()` type parameters).
        constructor: Option<ResolvedMethod>,
        /// May be empty: an empty literal needs no adder.
        adders: Arc<[ResolvedMethod]>,
    },
    CollectionBuilder {
        concrete: TypeId,
        element: TypeId,
        /// `ReadOnlySpan<element>`, the last parameter of every overload.
        span_type: TypeId,
        span_constructor: ResolvedMethod,
        /// The overload a literal without `with(...)` calls: every parameter
        /// before the span is optional. Fewest parameters wins.
        create: Option<ResolvedMethod>,
        /// Every usable overload, for `with(...)` arguments.
        overloads: Arc<[ResolvedMethod]>,
    },
}

impl ConstructibilityVerdict {
    pub fn is_constructible(&self) -> bool {
        !matches!(self, ConstructibilityVerdict::NotConstructible(_))
    }

    pub fn reason(&self) -> Option<NotConstructibleReason> {
        match self {
            ConstructibilityVerdict::NotConstructible(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<TypeId> {
        match self {
            ConstructibilityVerdict::NotConstructible(_) => None,
            ConstructibilityVerdict::Array { element, .. }
            | ConstructibilityVerdict::Span { element, .. }
            | ConstructibilityVerdict::InterfaceBackedByDefault { element, .. }
            | ConstructibilityVerdict::UserDefinedCollection { element, .. }
            | ConstructibilityVerdict::CollectionBuilder { element, .. } => Some(*element),
        }
    }

    /// Adder candidates for collection targets; `None` for arrays, spans and
    /// builder-constructed types.
    pub fn adders(&self) -> Option<&Arc<[ResolvedMethod]>> {
        match self {
            ConstructibilityVerdict::InterfaceBackedByDefault { adders, .. }
            | ConstructibilityVerdict::UserDefinedCollection { adders, .. } => Some(adders),
            _ => None,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            ConstructibilityVerdict::NotConstructible(_) => "not_constructible",
            ConstructibilityVerdict::Array { .. } => "array",
            ConstructibilityVerdict::Span { .. } => "span",
            ConstructibilityVerdict::InterfaceBackedByDefault { .. } => "interface_backed_by_default",
            ConstructibilityVerdict::UserDefinedCollection { .. } => "user_defined_collection",
            ConstructibilityVerdict::CollectionBuilder { .. } => "collection_builder",
        }
    }
}

pub struct ConstructibilityClassifier<'a> {
    db: &'a dyn TypeDatabase,
    caches: &'a SolverCaches,
    locator: &'a ShapeLocator<'a>,
}

impl<'a> ConstructibilityClassifier<'a> {
    pub fn new(locator: &'a ShapeLocator<'a>) -> Self {
        Self {
            db: locator.db(),
            caches: locator.caches(),
            locator,
        }
    }

    pub fn classify(&self, target: TypeId) -> ConstructibilityVerdict {
        let target = strip_nullable_ref(self.db, target);
        self.caches.verdict((target, *self.locator.access()), || {
            let verdict = self.compute(target);
            debug!(
                target = target.0,
                verdict = verdict.kind_str(),
                reason = verdict.reason().map(NotConstructibleReason::as_str),
                "classified constructibility"
            );
            verdict
        })
    }

    /// Check the type of a `params` parameter: arrays and constructible
    /// collections are accepted. Returns the element type.
    pub fn validate_params_collection(
        &self,
        param_type: TypeId,
    ) -> Result<TypeId, NotConstructibleReason> {
        let verdict = self.classify(param_type);
        match (verdict.element_type(), verdict.reason()) {
            (Some(element), _) => Ok(element),
            (None, Some(reason)) => Err(reason),
            (None, None) => Err(NotConstructibleReason::RestrictedType),
        }
    }

    fn compute(&self, target: TypeId) -> ConstructibilityVerdict {
        use ConstructibilityVerdict::NotConstructible;
        let db = self.db;
        let Some(data) = db.lookup(target) else {
            return NotConstructible(NotConstructibleReason::RestrictedType);
        };
        match data {
            TypeData::Array { element, rank: 1 } => {
                ConstructibilityVerdict::Array { element, rank: 1 }
            }
            TypeData::Array { .. }
            | TypeData::Intrinsic(_)
            | TypeData::Pointer(_)
            | TypeData::FunctionPointer { .. }
            | TypeData::Nullable(_) => NotConstructible(NotConstructibleReason::RestrictedType),
            TypeData::NullableRef(inner) => self.compute(inner),
            TypeData::TypeParameter(param) => self.type_parameter(target, param),
            TypeData::Named { def, args } => match db.defs().get_well_known_tag(def) {
                Some(tag @ (WellKnownType::SpanT | WellKnownType::ReadOnlySpanT)) => {
                    self.span(target, tag, args.first().copied())
                }
                Some(tag) if tag.is_collection_interface() => {
                    self.interface_backed(target, args.first().copied())
                }
                _ => match db.defs().get_collection_builder(def) {
                    Some(attr) => self.builder(target, &args, attr),
                    None => self.user_defined(target, def),
                },
            },
        }
    }

    fn span(
        &self,
        target: TypeId,
        tag: WellKnownType,
        element: Option<TypeId>,
    ) -> ConstructibilityVerdict {
        let readonly = tag == WellKnownType::ReadOnlySpanT;
        let member = if readonly {
            WellKnownMember::ReadOnlySpanCtorArray
        } else {
            WellKnownMember::SpanCtorArray
        };
        let constructor = lookup_member(self.db, member)
            .and_then(|id| ResolvedMethod::new(self.db, id, target, 0));
        match (element, constructor) {
            (Some(element), Some(constructor)) => ConstructibilityVerdict::Span {
                span_type: target,
                element,
                readonly,
                constructor,
            },
            (None, _) => {
                ConstructibilityVerdict::NotConstructible(NotConstructibleReason::RestrictedType)
            }
            (_, None) => ConstructibilityVerdict::NotConstructible(
                NotConstructibleReason::MissingWellKnownMember(member),
            ),
        }
    }

    /// The collection interfaces are built as `List<T>` (`List<object>` for
    /// the non-generic ones).
    fn interface_backed(
        &self,
        interface: TypeId,
        element: Option<TypeId>,
    ) -> ConstructibilityVerdict {
        use ConstructibilityVerdict::NotConstructible;
        let db = self.db;
        let element = element.unwrap_or(TypeId::OBJECT);
        let Some(list) = db.well_known_type(WellKnownType::ListT, &[element]) else {
            return NotConstructible(NotConstructibleReason::MissingDefaultType(
                WellKnownType::ListT,
            ));
        };
        let resolve = |member: WellKnownMember| {
            lookup_member(db, member).and_then(|id| ResolvedMethod::new(db, id, list, 0))
        };
        let Some(constructor) = resolve(WellKnownMember::ListCtor) else {
            return NotConstructible(NotConstructibleReason::MissingWellKnownMember(
                WellKnownMember::ListCtor,
            ));
        };
        let Some(add) = resolve(WellKnownMember::ListAdd) else {
            return NotConstructible(NotConstructibleReason::MissingWellKnownMember(
                WellKnownMember::ListAdd,
            ));
        };
        ConstructibilityVerdict::InterfaceBackedByDefault {
            interface,
            element,
            concrete: list,
            constructor,
            adders: Arc::from(vec![add]),
        }
    }

    /// `[CollectionBuilder]`: the element comes from the enumerator shape
    /// alone (no `IEnumerable` needed, so ref structs qualify) and the
    /// builder's `Create` overloads must end in `ReadOnlySpan<element>` and
    /// return the target. Generic overloads take the target's type arguments.
    fn builder(
        &self,
        target: TypeId,
        target_args: &[TypeId],
        attr: CollectionBuilderAttr,
    ) -> ConstructibilityVerdict {
        use ConstructibilityVerdict::NotConstructible;
        let db = self.db;
        let Some(element) = self
            .locator
            .locate(target, ProtocolKind::EnumeratorProducer)
            .as_enumerator()
            .map(|shape| shape.iteration_type)
        else {
            return NotConstructible(NotConstructibleReason::NoBuilderElementType);
        };
        let Some(span_type) = db.well_known_type(WellKnownType::ReadOnlySpanT, &[element]) else {
            return NotConstructible(NotConstructibleReason::MissingDefaultType(
                WellKnownType::ReadOnlySpanT,
            ));
        };
        let member = WellKnownMember::ReadOnlySpanCtorArray;
        let Some(span_constructor) =
            lookup_member(db, member).and_then(|id| ResolvedMethod::new(db, id, span_type, 0))
        else {
            return NotConstructible(NotConstructibleReason::MissingWellKnownMember(member));
        };

        let builder_type = db.named(attr.builder, &[]);
        let access = self.locator.access();
        let overloads: Vec<ResolvedMethod> = db
            .defs()
            .get_methods(attr.builder)
            .into_iter()
            .filter_map(|id| db.defs().method(id).map(|info| (id, info)))
            .filter(|(_, info)| {
                info.name == attr.method
                    && info.kind == MethodKind::Ordinary
                    && info.is_static()
                    && info.generic_arity() == target_args.len()
                    && is_accessible(db, info.accessibility, attr.builder, access)
            })
            .filter_map(|(id, _)| {
                let method = ResolvedMethod::new(db, id, builder_type, 0)?;
                if target_args.is_empty() {
                    Some(method)
                } else {
                    method.with_type_args(db, target_args)
                }
            })
            .filter(|method| {
                method.return_type == target
                    && method
                        .params
                        .last()
                        .is_some_and(|last| last.ty == span_type && !last.by_ref)
            })
            .collect();
        if overloads.is_empty() {
            return NotConstructible(NotConstructibleReason::BuilderMethodNotFound(element));
        }
        let create = overloads
            .iter()
            .filter(|method| {
                let leading = &method.params[..method.params.len() - 1];
                leading.iter().all(|p| p.kind == ParamKind::Optional)
            })
            .min_by_key(|method| method.params.len())
            .cloned();
        ConstructibilityVerdict::CollectionBuilder {
            concrete: target,
            element,
            span_type,
            span_constructor,
            create,
            overloads: Arc::from(overloads),
        }
    }

    fn user_defined(&self, target: TypeId, def: DefId) -> ConstructibilityVerdict {
        use ConstructibilityVerdict::NotConstructible;
        let db = self.db;
        let Some(kind) = db.defs().get_kind(def) else {
            return NotConstructible(NotConstructibleReason::RestrictedType);
        };
        match kind {
            DefKind::Enum | DefKind::Delegate => {
                return NotConstructible(NotConstructibleReason::RestrictedType);
            }
            DefKind::Interface => return NotConstructible(NotConstructibleReason::Abstract),
            _ => {}
        }
        if db
            .defs()
            .get_flags(def)
            .intersects(DefFlags::ABSTRACT | DefFlags::STATIC)
        {
            return NotConstructible(NotConstructibleReason::Abstract);
        }
        let Some(element) = self.enumerable_element(target) else {
            return NotConstructible(NotConstructibleReason::NoEnumerablePattern);
        };
        let constructor = match self.parameterless_constructor(target, def) {
            Ok(constructor) => constructor,
            Err(reason) => return NotConstructible(reason),
        };
        ConstructibilityVerdict::UserDefinedCollection {
            concrete: target,
            element,
            constructor,
            adders: self.adders(target),
        }
    }

    fn type_parameter(
        &self,
        target: TypeId,
        param: TypeParamId,
    ) -> ConstructibilityVerdict {
        use ConstructibilityVerdict::NotConstructible;
        let Some(info) = self.db.defs().type_param(param) else {
            return NotConstructible(NotConstructibleReason::RestrictedType);
        };
        if !info.constraints.constructor && !info.constraints.value_type {
            return NotConstructible(NotConstructibleReason::NoParameterlessConstructor);
        }
        let Some(element) = self.enumerable_element(target) else {
            return NotConstructible(NotConstructibleReason::NoEnumerablePattern);
        };
        ConstructibilityVerdict::UserDefinedCollection {
            concrete: target,
            element,
            constructor: None,
            adders: self.adders(target),
        }
    }

    /// Iteration type, if the type implements the `IEnumerable` marker and
    /// exposes an enumerator shape.
    fn enumerable_element(&self, target: TypeId) -> Option<TypeId> {
        let marker = self.db.well_known_type(WellKnownType::IEnumerable, &[])?;
        if !implements_interface(self.db, target, marker) {
            return None;
        }
        self.locator
            .locate(target, ProtocolKind::EnumeratorProducer)
            .as_enumerator()
            .map(|shape| shape.iteration_type)
    }

    fn adders(&self, target: TypeId) -> Arc<[ResolvedMethod]> {
        match self.locator.locate(target, ProtocolKind::Adder).as_adders() {
            Some(adders) => Arc::clone(adders),
            None => Arc::from(Vec::new()),
        }
    }

    /// An accessible constructor callable without arguments. A class that
    /// declares none has the implicit public one; a struct always has one.
    fn parameterless_constructor(
        &self,
        target: TypeId,
        def: DefId,
    ) -> Result<Option<ResolvedMethod>, NotConstructibleReason> {
        let db = self.db;
        let constructors: Vec<_> = db
            .defs()
            .get_methods(def)
            .into_iter()
            .filter_map(|id| db.defs().method(id).map(|info| (id, info)))
            .filter(|(_, info)| info.kind == MethodKind::Constructor && !info.is_static())
            .collect();
        let is_struct = is_value_type(db, target);
        if constructors.is_empty() {
            return Ok(None);
        }

        let callable: Vec<_> = constructors
            .iter()
            .filter(|(_, info)| info.required_param_count() == 0)
            .collect();
        let accessible: Vec<_> = callable
            .iter()
            .filter(|(_, info)| is_accessible(db, info.accessibility, def, self.locator.access()))
            .collect();
        let chosen = accessible
            .iter()
            .find(|(_, info)| info.params.is_empty())
            .or_else(|| accessible.first());
        match chosen {
            Some((id, _)) => Ok(ResolvedMethod::new(db, *id, target, 0)),
            None if is_struct => Ok(None),
            None if !callable.is_empty() => Err(NotConstructibleReason::Inaccessible),
            None => Err(NotConstructibleReason::NoParameterlessConstructor),
        }
    }
}

#[cfg(test)]
#[path = "../tests/constructibility_tests.rs"]
mod tests;
