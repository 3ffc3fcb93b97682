//! Type-to-type conversion classification.
//!
//! [`Conversion`] is a closed set. User-defined conversion search consults
//! only [`Conversion::is_standard_implicit`], which is `false` for
//! collection-literal and lock-scope conversions, so those edges can never be
//! chained into a user-defined operator.
//!
//! Expression-level classification (literals, `null`, collection literals)
//! lives in the checker; this module answers "how does a value of type S
//! convert to T" and "how does this constant convert to T".

use crate::class_hierarchy::{
    all_interfaces, base_chain, is_ref_like, is_reference_type, is_value_type, strip_nullable_ref,
};
use crate::db::TypeDatabase;
use crate::def::{DefFlags, DefKind, WellKnownType};
use crate::types::{ConstantValue, IntrinsicKind, MethodId, TypeData, TypeId};
use crate::user_defined::{UserDefinedOutcome, find_implicit_user_defined};
use serde::Serialize;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Conversion {
    Identity,
    Numeric,
    /// Constant expression narrowed to a type it fits (`byte b = 5`).
    ImplicitConstant,
    ImplicitNullable,
    NullLiteral,
    Boxing,
    ImplicitReference,
    /// From `dynamic` to anything.
    ImplicitDynamic,
    /// A collection literal converted to a constructible target.
    CollectionLiteral,
    /// A scope-capable lock type converted to a reference type that is not
    /// itself scope-capable. Legal, with an advisory warning.
    LockScopeToReference,
    UserDefined(MethodId),
    /// A collection literal whose target has a user-defined conversion from
    /// the literal's would-be natural type. Never applied.
    UserDefinedExcluded,
    ExplicitOnly,
    NoConversion,
}

impl Conversion {
    pub const fn is_implicit(self) -> bool {
        !matches!(
            self,
            Conversion::ExplicitOnly | Conversion::NoConversion | Conversion::UserDefinedExcluded
        )
    }

    /// Conversions that user-defined conversion search may build on.
    pub const fn is_standard_implicit(self) -> bool {
        matches!(
            self,
            Conversion::Identity
                | Conversion::Numeric
                | Conversion::ImplicitConstant
                | Conversion::ImplicitNullable
                | Conversion::NullLiteral
                | Conversion::Boxing
                | Conversion::ImplicitReference
        )
    }

    pub const fn is_identity(self) -> bool {
        matches!(self, Conversion::Identity)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Conversion::Identity => "Identity",
            Conversion::Numeric => "Numeric",
            Conversion::ImplicitConstant => "ImplicitConstant",
            Conversion::ImplicitNullable => "ImplicitNullable",
            Conversion::NullLiteral => "NullLiteral",
            Conversion::Boxing => "Boxing",
            Conversion::ImplicitReference => "ImplicitReference",
            Conversion::ImplicitDynamic => "ImplicitDynamic",
            Conversion::CollectionLiteral => "CollectionLiteral",
            Conversion::LockScopeToReference => "LockScopeToReference",
            Conversion::UserDefined(_) => "UserDefined",
            Conversion::UserDefinedExcluded => "UserDefinedExcluded",
            Conversion::ExplicitOnly => "ExplicitOnly",
            Conversion::NoConversion => "NoConversion",
        }
    }
}

/// Predicate for "this type exposes the lock scope protocol".
pub type ScopeCheck<'a> = &'a (dyn Fn(TypeId) -> bool + Sync);

pub struct ConversionClassifier<'a> {
    db: &'a dyn TypeDatabase,
    scope_check: Option<ScopeCheck<'a>>,
}

impl<'a> ConversionClassifier<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            scope_check: None,
        }
    }

    /// Replace the default scope-capability test (the well-known `Lock`)
    /// with a structural one.
    pub fn with_scope_check(mut self, check: ScopeCheck<'a>) -> Self {
        self.scope_check = Some(check);
        self
    }

    pub fn db(&self) -> &'a dyn TypeDatabase {
        self.db
    }

    pub fn is_scope_capable(&self, ty: TypeId) -> bool {
        match self.scope_check {
            Some(check) => check(ty),
            None => matches!(self.db.well_known_of(ty), Some((WellKnownType::Lock, _))),
        }
    }

    /// Full classification: standard conversions, then user-defined operators.
    pub fn classify(&self, source: TypeId, target: TypeId) -> Conversion {
        let standard = self.standard(source, target);
        if standard.is_implicit() {
            return standard;
        }
        match find_implicit_user_defined(self, source, target) {
            UserDefinedOutcome::Unique(method) => Conversion::UserDefined(method),
            UserDefinedOutcome::Ambiguous(_) | UserDefinedOutcome::None => standard,
        }
    }

    /// Standard conversions only (no user-defined operators).
    pub fn standard(&self, source: TypeId, target: TypeId) -> Conversion {
        let source = strip_nullable_ref(self.db, source);
        let target = strip_nullable_ref(self.db, target);
        if source == target || source.is_error() || target.is_error() {
            return Conversion::Identity;
        }
        let conversion = match self.implicit(source, target) {
            Some(Conversion::ImplicitReference | Conversion::Boxing)
                if self.is_scope_capable(source) && !self.is_scope_capable(target) =>
            {
                Conversion::LockScopeToReference
            }
            Some(c) => c,
            None if self.explicit_exists(source, target) => Conversion::ExplicitOnly,
            None => Conversion::NoConversion,
        };
        trace!(
            source = source.0,
            target = target.0,
            conversion = conversion.as_str(),
            "standard conversion"
        );
        conversion
    }

    /// Conversion of a compile-time constant (literal) to `target`.
    pub fn classify_constant(&self, value: &ConstantValue, target: TypeId) -> Conversion {
        let Some(source) = value.natural_type() else {
            return self.classify_null(target);
        };
        let standard = self.standard(source, target);
        if standard.is_implicit() {
            return standard;
        }
        let target = strip_nullable_ref(self.db, target);
        let is_integral_constant = matches!(
            value,
            ConstantValue::Int(_) | ConstantValue::Long(_)
        );
        match self.db.lookup(target) {
            Some(TypeData::Intrinsic(kind))
                if is_integral_constant && is_integral(kind) && value.convert_to(kind).is_some() =>
            {
                Conversion::ImplicitConstant
            }
            Some(TypeData::Nullable(inner)) => match self.db.lookup(inner) {
                Some(TypeData::Intrinsic(kind))
                    if is_integral_constant && is_integral(kind) && value.convert_to(kind).is_some() =>
                {
                    Conversion::ImplicitNullable
                }
                _ => standard,
            },
            Some(TypeData::Named { def, .. })
                if value.as_integer() == Some(0)
                    && self.db.defs().get_kind(def) == Some(DefKind::Enum) =>
            {
                Conversion::ImplicitConstant
            }
            _ => self.classify(source, target),
        }
    }

    /// Conversion of the `null` literal.
    pub fn classify_null(&self, target: TypeId) -> Conversion {
        if self.accepts_null(target) {
            Conversion::NullLiteral
        } else {
            Conversion::NoConversion
        }
    }

    pub fn accepts_null(&self, target: TypeId) -> bool {
        if target.is_error() {
            return true;
        }
        match self.db.lookup(target) {
            Some(TypeData::Nullable(_) | TypeData::Pointer(_) | TypeData::NullableRef(_)) => true,
            Some(TypeData::Intrinsic(IntrinsicKind::Null)) => true,
            Some(_) => is_reference_type(self.db, target),
            None => false,
        }
    }

    fn implicit(&self, source: TypeId, target: TypeId) -> Option<Conversion> {
        let db = self.db;
        let source_data = db.lookup(source)?;
        let target_data = db.lookup(target)?;

        // object and dynamic are identity-convertible.
        if matches!(
            (source, target),
            (TypeId::OBJECT, TypeId::DYNAMIC) | (TypeId::DYNAMIC, TypeId::OBJECT)
        ) {
            return Some(Conversion::Identity);
        }
        if source == TypeId::DYNAMIC {
            return (!matches!(target_data, TypeData::Pointer(_)) && target != TypeId::VOID)
                .then_some(Conversion::ImplicitDynamic);
        }
        if source == TypeId::NULL {
            return self.accepts_null(target).then_some(Conversion::NullLiteral);
        }

        if let (TypeData::Intrinsic(s), TypeData::Intrinsic(t)) = (&source_data, &target_data) {
            if implicit_numeric(*s, *t) {
                return Some(Conversion::Numeric);
            }
        }

        if let TypeData::Nullable(target_inner) = target_data {
            let underlying = match source_data {
                TypeData::Nullable(source_inner) => source_inner,
                _ => source,
            };
            return match (db.lookup(underlying), db.lookup(target_inner)) {
                _ if underlying == target_inner => Some(Conversion::ImplicitNullable),
                (Some(TypeData::Intrinsic(s)), Some(TypeData::Intrinsic(t)))
                    if implicit_numeric(s, t) =>
                {
                    Some(Conversion::ImplicitNullable)
                }
                _ => None,
            };
        }

        if matches!(source_data, TypeData::Pointer(_) | TypeData::FunctionPointer { .. })
            || matches!(target_data, TypeData::Pointer(_) | TypeData::FunctionPointer { .. })
            || source == TypeId::VOID
            || target == TypeId::VOID
        {
            return None;
        }

        // Everything left converts by reference or by boxing.
        let source_is_value = match source_data {
            TypeData::Nullable(_) => true,
            _ => is_value_type(db, source),
        };
        let by = |reachable: bool| -> Option<Conversion> {
            if !reachable {
                return None;
            }
            if is_ref_like(db, source) {
                return None;
            }
            if source_is_value {
                return Some(Conversion::Boxing);
            }
            match source_data {
                TypeData::TypeParameter(_) if !is_reference_type(db, source) => {
                    Some(Conversion::Boxing)
                }
                _ => Some(Conversion::ImplicitReference),
            }
        };

        if target == TypeId::OBJECT || target == TypeId::DYNAMIC {
            return by(true);
        }
        let boxed_source = match source_data {
            TypeData::Nullable(inner) => inner,
            _ => source,
        };

        // Array covariance: S[] -> T[] when S converts to T by reference.
        if let (
            TypeData::Array {
                element: se,
                rank: sr,
            },
            TypeData::Array {
                element: te,
                rank: tr,
            },
        ) = (&source_data, &target_data)
        {
            let covariant = sr == tr
                && is_reference_type(db, *se)
                && self.implicit(*se, *te) == Some(Conversion::ImplicitReference);
            return covariant.then_some(Conversion::ImplicitReference);
        }

        if base_chain(db, boxed_source).contains(&target) {
            return by(true);
        }
        if self.implements_with_variance(boxed_source, target) {
            return by(true);
        }
        // A type parameter converts to another type parameter it is constrained to.
        if let TypeData::TypeParameter(param) = source_data {
            let constrained = db
                .defs()
                .type_param(param)
                .is_some_and(|info| info.constraints.types.contains(&target));
            return by(constrained);
        }
        None
    }

    /// Does `source` implement `target`, allowing covariance on the
    /// read-only enumeration interfaces?
    fn implements_with_variance(&self, source: TypeId, target: TypeId) -> bool {
        let db = self.db;
        let Some(TypeData::Named {
            def: target_def,
            args: target_args,
        }) = db.lookup(target)
        else {
            return false;
        };
        if db.defs().get_kind(target_def) != Some(DefKind::Interface) {
            return false;
        }
        let covariant = db
            .defs()
            .get_well_known_tag(target_def)
            .is_some_and(is_covariant_interface);
        let mut candidates = all_interfaces(db, source);
        candidates.push(source);
        candidates.into_iter().any(|iface| {
            if iface == target {
                return true;
            }
            match db.lookup(iface) {
                Some(TypeData::Named { def, args }) if covariant && def == target_def => args
                    .iter()
                    .zip(target_args.iter())
                    .all(|(&a, &b)| {
                        a == b
                            || (is_reference_type(db, a)
                                && self.implicit(a, b) == Some(Conversion::ImplicitReference))
                    }),
                _ => false,
            }
        })
    }

    fn explicit_exists(&self, source: TypeId, target: TypeId) -> bool {
        let db = self.db;
        let (Some(source_data), Some(target_data)) = (db.lookup(source), db.lookup(target)) else {
            return false;
        };
        let is_enum = |data: &TypeData| match data {
            TypeData::Named { def, .. } => db.defs().get_kind(*def) == Some(DefKind::Enum),
            _ => false,
        };
        let is_numeric = |data: &TypeData| matches!(data, TypeData::Intrinsic(k) if k.is_numeric());
        if (is_numeric(&source_data) || is_enum(&source_data))
            && (is_numeric(&target_data) || is_enum(&target_data))
        {
            return true;
        }
        if let TypeData::Nullable(inner) = source_data {
            return inner == target
                || self.implicit(inner, target).is_some()
                || self.explicit_exists(inner, target);
        }
        if matches!(target_data, TypeData::Pointer(_) | TypeData::FunctionPointer { .. }) {
            return false;
        }
        if source == TypeId::OBJECT {
            return !is_ref_like(db, target);
        }
        if matches!(source_data, TypeData::TypeParameter(_))
            || matches!(target_data, TypeData::TypeParameter(_))
        {
            return true;
        }
        // Downcasts along the base chain.
        if base_chain(db, target).contains(&source) {
            return true;
        }
        let is_interface = |ty: TypeId| {
            db.def_of(ty)
                .and_then(|d| db.defs().get_kind(d))
                .is_some_and(|k| k == DefKind::Interface)
        };
        let is_sealed = |ty: TypeId| {
            db.def_of(ty)
                .is_some_and(|d| db.defs().get_flags(d).contains(DefFlags::SEALED))
        };
        if is_interface(source)
            && (!is_sealed(target) || self.implements_with_variance(target, source))
        {
            return !is_ref_like(db, target);
        }
        if is_interface(target) && is_reference_type(db, source) && !is_sealed(source) {
            return true;
        }
        false
    }
}

fn is_covariant_interface(tag: WellKnownType) -> bool {
    matches!(
        tag,
        WellKnownType::IEnumerableT
            | WellKnownType::IEnumeratorT
            | WellKnownType::IReadOnlyCollectionT
            | WellKnownType::IReadOnlyListT
    )
}

pub(crate) const fn is_integral(kind: IntrinsicKind) -> bool {
    matches!(
        kind,
        IntrinsicKind::SByte
            | IntrinsicKind::Byte
            | IntrinsicKind::Short
            | IntrinsicKind::UShort
            | IntrinsicKind::Int
            | IntrinsicKind::UInt
            | IntrinsicKind::Long
            | IntrinsicKind::ULong
            | IntrinsicKind::Char
    )
}

pub(crate) const fn is_signed_integral(kind: IntrinsicKind) -> bool {
    matches!(
        kind,
        IntrinsicKind::SByte | IntrinsicKind::Short | IntrinsicKind::Int | IntrinsicKind::Long
    )
}

pub(crate) const fn is_unsigned_integral(kind: IntrinsicKind) -> bool {
    matches!(
        kind,
        IntrinsicKind::Byte | IntrinsicKind::UShort | IntrinsicKind::UInt | IntrinsicKind::ULong
    )
}

/// The implicit numeric conversion table.
pub const fn implicit_numeric(source: IntrinsicKind, target: IntrinsicKind) -> bool {
    use IntrinsicKind::*;
    match source {
        SByte => matches!(target, Short | Int | Long | Float | Double | Decimal),
        Byte => matches!(
            target,
            Short | UShort | Int | UInt | Long | ULong | Float | Double | Decimal
        ),
        Short => matches!(target, Int | Long | Float | Double | Decimal),
        UShort => matches!(target, Int | UInt | Long | ULong | Float | Double | Decimal),
        Int => matches!(target, Long | Float | Double | Decimal),
        UInt => matches!(target, Long | ULong | Float | Double | Decimal),
        Long | ULong => matches!(target, Float | Double | Decimal),
        Char => matches!(
            target,
            UShort | Int | UInt | Long | ULong | Float | Double | Decimal
        ),
        Float => matches!(target, Double),
        _ => false,
    }
}

/// Which of two conversion targets is better for the same source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BetterTarget {
    First,
    Second,
    Neither,
}

/// Better conversion target: an implicit conversion from `t1` to `t2` (and
/// none back) makes `t1` better; signed integrals beat unsigned ones.
pub fn better_conversion_target(
    classifier: &ConversionClassifier<'_>,
    t1: TypeId,
    t2: TypeId,
) -> BetterTarget {
    if t1 == t2 {
        return BetterTarget::Neither;
    }
    let forward = classifier.standard(t1, t2).is_implicit();
    let backward = classifier.standard(t2, t1).is_implicit();
    match (forward, backward) {
        (true, false) => return BetterTarget::First,
        (false, true) => return BetterTarget::Second,
        _ => {}
    }
    let db = classifier.db();
    if let (Some(TypeData::Intrinsic(a)), Some(TypeData::Intrinsic(b))) = (db.lookup(t1), db.lookup(t2)) {
        if is_signed_integral(a) && is_unsigned_integral(b) {
            return BetterTarget::First;
        }
        if is_unsigned_integral(a) && is_signed_integral(b) {
            return BetterTarget::Second;
        }
    }
    BetterTarget::Neither
}

#[cfg(test)]
#[path = "../tests/conversions_tests.rs"]
mod tests;
