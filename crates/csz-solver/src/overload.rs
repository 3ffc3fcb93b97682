//! Overload resolution seam and the default best-match resolver.
//!
//! Collection literals call adders through whatever overload-resolution
//! service the host provides. [`BestMatchResolver`] is the bundled one: it
//! is enough for adder selection, collection arguments and constructor
//! choice, not a full implementation of the language's betterness rules.

use crate::class_hierarchy::{ResolvedMethod, all_interfaces, base_chain};
use crate::conversions::{BetterTarget, Conversion, ConversionClassifier, better_conversion_target};
use crate::db::TypeDatabase;
use crate::instantiate::{TypeSubstitution, contains_type_params, instantiate_type};
use crate::types::{ParamKind, TypeArgs, TypeData, TypeId, TypeParamId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Arguments of a call, as the resolver sees them.
///
/// Arguments without a type of their own (`null`, nested collection
/// literals) answer `None` from `arg_type` and are still classified by
/// `conversion_to`.
pub trait ArgumentSource {
    fn arg_count(&self) -> usize;
    fn arg_type(&self, index: usize) -> Option<TypeId>;
    fn conversion_to(&self, index: usize, target: TypeId) -> Conversion;
}

/// Arguments given only by type; every conversion is a plain type-to-type one.
pub struct TypedArguments<'a, 'c> {
    classifier: &'c ConversionClassifier<'a>,
    types: &'c [TypeId],
}

impl<'a, 'c> TypedArguments<'a, 'c> {
    pub fn new(classifier: &'c ConversionClassifier<'a>, types: &'c [TypeId]) -> Self {
        Self { classifier, types }
    }
}

impl ArgumentSource for TypedArguments<'_, '_> {
    fn arg_count(&self) -> usize {
        self.types.len()
    }

    fn arg_type(&self, index: usize) -> Option<TypeId> {
        self.types.get(index).copied()
    }

    fn conversion_to(&self, index: usize, target: TypeId) -> Conversion {
        match self.types.get(index) {
            Some(&source) => self.classifier.classify(source, target),
            None => Conversion::NoConversion,
        }
    }
}

/// An applicable candidate with the conversion chosen for each argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applicable {
    pub method: ResolvedMethod,
    pub conversions: SmallVec<[Conversion; 4]>,
    /// Parameter type each argument converts to.
    pub param_types: SmallVec<[TypeId; 4]>,
    /// Applicable only in the expanded `params` form.
    pub expanded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverloadResult {
    Success(Applicable),
    /// No single best candidate; the two named are the first tied pair.
    Ambiguous(ResolvedMethod, ResolvedMethod),
    NoApplicable {
        /// Closest candidate by arity, for diagnostics.
        best: Option<ResolvedMethod>,
        /// First argument that failed to convert for `best`.
        failed_arg: Option<usize>,
    },
    Empty,
}

impl OverloadResult {
    pub fn applicable(&self) -> Option<&Applicable> {
        match self {
            OverloadResult::Success(applicable) => Some(applicable),
            _ => None,
        }
    }
}

/// Picks one member of a candidate set for a set of arguments.
pub trait OverloadResolver: Send + Sync {
    fn resolve(
        &self,
        classifier: &ConversionClassifier<'_>,
        candidates: &[ResolvedMethod],
        args: &dyn ArgumentSource,
    ) -> OverloadResult;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BestMatchResolver;

impl OverloadResolver for BestMatchResolver {
    fn resolve(
        &self,
        classifier: &ConversionClassifier<'_>,
        candidates: &[ResolvedMethod],
        args: &dyn ArgumentSource,
    ) -> OverloadResult {
        if candidates.is_empty() {
            return OverloadResult::Empty;
        }
        let db = classifier.db();
        let mut applicable = Vec::new();
        for candidate in candidates {
            let Some(method) = infer_type_args(db, candidate, args) else {
                continue;
            };
            if let Some(found) = check_applicable(db, &method, args) {
                applicable.push(found);
            }
        }

        // Instance members first; extensions only when none applies.
        let has_instance = applicable.iter().any(|a| !a.method.is_extension);
        applicable.retain(|a| !has_instance || !a.method.is_extension);
        // Members of a more derived type shadow applicable base members.
        if let Some(min_depth) = applicable
            .iter()
            .filter(|a| !a.method.is_extension)
            .map(|a| a.method.depth)
            .min()
        {
            applicable.retain(|a| a.method.is_extension || a.method.depth == min_depth);
        }

        let result = match applicable.len() {
            0 => no_applicable(candidates, args),
            1 => OverloadResult::Success(applicable.swap_remove(0)),
            _ => pick_best(classifier, applicable, args),
        };
        trace!(
            candidates = candidates.len(),
            args = args.arg_count(),
            outcome = match &result {
                OverloadResult::Success(_) => "success",
                OverloadResult::Ambiguous(..) => "ambiguous",
                OverloadResult::NoApplicable { .. } => "no_applicable",
                OverloadResult::Empty => "empty",
            },
            "overload resolution"
        );
        result
    }
}

fn check_applicable(
    db: &dyn TypeDatabase,
    method: &ResolvedMethod,
    args: &dyn ArgumentSource,
) -> Option<Applicable> {
    let params = method.call_params();
    let count = args.arg_count();

    let normal = || -> Option<Applicable> {
        if count > params.len() || params[count..].iter().any(|p| p.kind == ParamKind::Normal) {
            return None;
        }
        let mut conversions = SmallVec::new();
        let mut param_types = SmallVec::new();
        for (index, param) in params.iter().take(count).enumerate() {
            let conversion = args.conversion_to(index, param.ty);
            if !conversion.is_implicit() || (param.by_ref && !conversion.is_identity()) {
                return None;
            }
            conversions.push(conversion);
            param_types.push(param.ty);
        }
        Some(Applicable {
            method: method.clone(),
            conversions,
            param_types,
            expanded: false,
        })
    };
    if let Some(found) = normal() {
        return Some(found);
    }

    // Expanded form: `params T[] xs` soaks up the trailing arguments.
    let (last, fixed) = params.split_last()?;
    if last.kind != ParamKind::Params || count < fixed.len() {
        return None;
    }
    let element = params_element(db, last.ty)?;
    let mut conversions = SmallVec::new();
    let mut param_types = SmallVec::new();
    for index in 0..count {
        let target = fixed.get(index).map_or(element, |p| p.ty);
        let conversion = args.conversion_to(index, target);
        if !conversion.is_implicit() {
            return None;
        }
        conversions.push(conversion);
        param_types.push(target);
    }
    Some(Applicable {
        method: method.clone(),
        conversions,
        param_types,
        expanded: true,
    })
}

/// Element type of an array-typed `params` parameter. Collection-typed
/// `params` parameters are bound through a collection literal instead.
fn params_element(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeId> {
    match db.lookup(ty)? {
        TypeData::Array { element, rank: 1 } => Some(element),
        _ => None,
    }
}

fn no_applicable(candidates: &[ResolvedMethod], args: &dyn ArgumentSource) -> OverloadResult {
    let count = args.arg_count();
    let best = candidates
        .iter()
        .find(|c| {
            let params = c.call_params();
            count <= params.len() && c.required_param_count() <= count + usize::from(c.is_extension)
        })
        .or_else(|| candidates.first())
        .cloned();
    let failed_arg = best.as_ref().and_then(|method| {
        method
            .call_params()
            .iter()
            .take(count)
            .enumerate()
            .position(|(index, param)| !args.conversion_to(index, param.ty).is_implicit())
    });
    OverloadResult::NoApplicable { best, failed_arg }
}

fn pick_best(
    classifier: &ConversionClassifier<'_>,
    applicable: Vec<Applicable>,
    args: &dyn ArgumentSource,
) -> OverloadResult {
    let winner = applicable.iter().position(|candidate| {
        applicable
            .iter()
            .filter(|other| !std::ptr::eq(*other, candidate))
            .all(|other| is_better(classifier, candidate, other, args))
    });
    match winner {
        Some(index) => {
            let mut applicable = applicable;
            OverloadResult::Success(applicable.swap_remove(index))
        }
        None => {
            let first = applicable[0].method.clone();
            let second = applicable[1].method.clone();
            debug!(
                first = first.id.0,
                second = second.id.0,
                "ambiguous overload"
            );
            OverloadResult::Ambiguous(first, second)
        }
    }
}

/// Is `a` a better function member than `b` for these arguments?
pub fn is_better(
    classifier: &ConversionClassifier<'_>,
    a: &Applicable,
    b: &Applicable,
    args: &dyn ArgumentSource,
) -> bool {
    let mut any_better = false;
    for index in 0..args.arg_count() {
        let (Some(&ta), Some(&tb)) = (a.param_types.get(index), b.param_types.get(index)) else {
            continue;
        };
        match better_conversion_from_argument(classifier, args.arg_type(index), ta, tb) {
            BetterTarget::First => any_better = true,
            BetterTarget::Second => return false,
            BetterTarget::Neither => {}
        }
    }
    if any_better {
        return true;
    }
    if a.param_types != b.param_types {
        return false;
    }
    // Identical parameter types: tie-breaks.
    if (a.method.generic_arity == 0) != (b.method.generic_arity == 0) {
        return a.method.generic_arity == 0;
    }
    if a.expanded != b.expanded {
        return !a.expanded;
    }
    let defaults = |x: &Applicable| x.method.call_params().len().saturating_sub(args.arg_count());
    defaults(a) < defaults(b)
}

/// Better conversion from an argument to one of two parameter types.
pub fn better_conversion_from_argument(
    classifier: &ConversionClassifier<'_>,
    arg_type: Option<TypeId>,
    t1: TypeId,
    t2: TypeId,
) -> BetterTarget {
    if t1 == t2 {
        return BetterTarget::Neither;
    }
    match arg_type {
        Some(source) if source == t1 => BetterTarget::First,
        Some(source) if source == t2 => BetterTarget::Second,
        _ => better_conversion_target(classifier, t1, t2),
    }
}

// =============================================================================
// Type argument inference
// =============================================================================

/// Infer the method type arguments of a generic candidate from argument
/// types. Non-generic (or already inferred) candidates pass through.
pub fn infer_type_args(
    db: &dyn TypeDatabase,
    method: &ResolvedMethod,
    args: &dyn ArgumentSource,
) -> Option<ResolvedMethod> {
    if method.generic_arity == 0 || !method.type_args.is_empty() {
        return Some(method.clone());
    }
    let info = db.defs().method(method.id)?;
    let mut bindings: FxHashMap<TypeParamId, TypeId> = FxHashMap::default();
    // A receiver bound by `bind_extension_receiver` carries what it fixed.
    if method.is_extension {
        if let (Some(declared), Some(bound)) = (info.params.first(), method.params.first()) {
            if declared.ty != bound.ty {
                unify(db, declared.ty, bound.ty, &info.type_params, &mut bindings);
            }
        }
    }
    let params = method.call_params();
    for index in 0..args.arg_count() {
        let Some(arg) = args.arg_type(index) else {
            continue;
        };
        let is_array_arg = matches!(db.lookup(arg), Some(TypeData::Array { .. }));
        let formal = match params.get(index) {
            Some(p) if p.kind == ParamKind::Params && !is_array_arg => {
                params_element(db, p.ty).unwrap_or(p.ty)
            }
            Some(p) => p.ty,
            None => match params.last() {
                Some(p) if p.kind == ParamKind::Params => match params_element(db, p.ty) {
                    Some(element) => element,
                    None => break,
                },
                _ => break,
            },
        };
        unify(db, formal, arg, &info.type_params, &mut bindings);
    }
    let type_args: Option<TypeArgs> = info
        .type_params
        .iter()
        .map(|tp| bindings.get(tp).copied())
        .collect();
    let type_args = type_args?;
    trace!(method = method.id.0, args = ?type_args, "inferred type arguments");
    method.with_type_args(db, &type_args)
}

/// Bind an extension method's `this` parameter to `receiver`.
///
/// Method type arguments that the receiver fixes are inferred here when the
/// receiver fixes all of them; otherwise the method stays generic and the
/// call arguments finish inference. Only identity, reference and boxing
/// conversions bind a receiver.
pub fn bind_extension_receiver(
    classifier: &ConversionClassifier<'_>,
    method: &ResolvedMethod,
    receiver: TypeId,
) -> Option<ResolvedMethod> {
    let db = classifier.db();
    if !method.is_extension {
        return None;
    }
    let this_param = method.params.first()?;
    let mut bound = method.clone();
    if method.generic_arity > 0 && method.type_args.is_empty() {
        let info = db.defs().method(method.id)?;
        let mut bindings: FxHashMap<TypeParamId, TypeId> = FxHashMap::default();
        unify(db, this_param.ty, receiver, &info.type_params, &mut bindings);
        let type_args: Option<TypeArgs> = info
            .type_params
            .iter()
            .map(|tp| bindings.get(tp).copied())
            .collect();
        match type_args {
            Some(args) => bound = method.with_type_args(db, &args)?,
            // Partially fixed: accept when the receiver matches the
            // generic definition, record what it fixed in the receiver
            // slot, and let the arguments decide the rest.
            None => {
                let matches_def = match db.def_of(this_param.ty) {
                    Some(def) => std::iter::once(receiver)
                        .chain(base_chain(db, receiver))
                        .chain(all_interfaces(db, receiver))
                        .any(|t| db.def_of(t) == Some(def)),
                    None => contains_type_params(db, this_param.ty),
                };
                if !matches_def {
                    return None;
                }
                let mut partial = TypeSubstitution::new();
                for (&tp, &ty) in &bindings {
                    partial.insert(tp, ty);
                }
                bound.params[0].ty = instantiate_type(db, this_param.ty, &partial);
                return Some(bound);
            }
        }
    }
    let this_ty = bound.params.first()?.ty;
    matches!(
        classifier.standard(receiver, this_ty),
        Conversion::Identity | Conversion::ImplicitReference | Conversion::Boxing
    )
    .then_some(bound)
}

fn unify(
    db: &dyn TypeDatabase,
    formal: TypeId,
    actual: TypeId,
    method_params: &[TypeParamId],
    bindings: &mut FxHashMap<TypeParamId, TypeId>,
) {
    let Some(formal_data) = db.lookup(formal) else {
        return;
    };
    match formal_data {
        TypeData::TypeParameter(tp) if method_params.contains(&tp) => {
            bindings.entry(tp).or_insert(actual);
        }
        TypeData::Array { element, rank } => {
            if let Some(TypeData::Array {
                element: actual_element,
                rank: actual_rank,
            }) = db.lookup(actual)
            {
                if rank == actual_rank {
                    unify(db, element, actual_element, method_params, bindings);
                }
            }
        }
        TypeData::Nullable(inner) => {
            if let Some(TypeData::Nullable(actual_inner)) = db.lookup(actual) {
                unify(db, inner, actual_inner, method_params, bindings);
            }
        }
        TypeData::Named { def, args } if !args.is_empty() => {
            // Match against the argument type, its bases, or its interfaces.
            let matching = std::iter::once(actual)
                .chain(base_chain(db, actual))
                .chain(all_interfaces(db, actual))
                .find(|&candidate| db.def_of(candidate) == Some(def));
            if let Some(TypeData::Named {
                args: actual_args, ..
            }) = matching.and_then(|m| db.lookup(m))
            {
                for (&f, &a) in args.iter().zip(actual_args.iter()) {
                    unify(db, f, a, method_params, bindings);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "../tests/overload_tests.rs"]
mod tests;
