//! User-defined implicit conversion search.
//!
//! Operators are collected from the source and target types and their base
//! classes. An operator applies only when both legs (source to its parameter,
//! its return to the target) are standard implicit conversions, so a
//! collection-literal or lock-scope edge can never feed an operator.

use crate::class_hierarchy::base_chain;
use crate::conversions::ConversionClassifier;
use crate::def::DefId;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::types::{MethodId, MethodKind, TypeData, TypeId};
use csz_common::limits::MAX_USER_DEFINED_CANDIDATES;
use indexmap::IndexSet;
use smallvec::SmallVec;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserDefinedOutcome {
    None,
    Unique(MethodId),
    Ambiguous(SmallVec<[MethodId; 2]>),
}

impl UserDefinedOutcome {
    pub fn exists(&self) -> bool {
        !matches!(self, UserDefinedOutcome::None)
    }
}

#[derive(Clone, Copy, Debug)]
struct Operator {
    method: MethodId,
    from: TypeId,
    to: TypeId,
}

/// Find the implicit user-defined conversion from `source` to `target`.
pub fn find_implicit_user_defined(
    classifier: &ConversionClassifier<'_>,
    source: TypeId,
    target: TypeId,
) -> UserDefinedOutcome {
    let db = classifier.db();
    let unwrap_nullable = |ty: TypeId| match db.lookup(ty) {
        Some(TypeData::Nullable(inner) | TypeData::NullableRef(inner)) => inner,
        _ => ty,
    };
    let source_core = unwrap_nullable(source);
    let target_core = unwrap_nullable(target);

    // Owning types, each searched once.
    let mut owners: IndexSet<(DefId, TypeId)> = IndexSet::new();
    for ty in [source_core, target_core] {
        for owner in std::iter::once(ty).chain(base_chain(db, ty)) {
            if let Some(def) = db.def_of(owner) {
                owners.insert((def, owner));
            }
        }
    }

    let mut applicable: Vec<Operator> = Vec::new();
    for &(def, owner) in &owners {
        if applicable.len() >= MAX_USER_DEFINED_CANDIDATES {
            break;
        }
        let subst = TypeSubstitution::for_type(db, owner);
        for id in db.defs().get_methods(def) {
            let Some(info) = db.defs().method(id) else {
                continue;
            };
            if info.kind != (MethodKind::Conversion { implicit: true }) || info.params.len() != 1 {
                continue;
            }
            let from = instantiate_type(db, info.params[0].ty, &subst);
            let to = instantiate_type(db, info.return_type, &subst);
            if classifier.standard(source, from).is_standard_implicit()
                && classifier.standard(to, target).is_standard_implicit()
                && !applicable.iter().any(|op| op.method == id)
            {
                applicable.push(Operator { method: id, from, to });
                if applicable.len() >= MAX_USER_DEFINED_CANDIDATES {
                    trace!(source = source.0, target = target.0, "user-defined candidate limit reached");
                    break;
                }
            }
        }
    }

    let outcome = pick_most_specific(classifier, source, target, &applicable);
    trace!(
        source = source.0,
        target = target.0,
        candidates = applicable.len(),
        outcome = ?outcome,
        "user-defined conversion search"
    );
    outcome
}

fn pick_most_specific(
    classifier: &ConversionClassifier<'_>,
    source: TypeId,
    target: TypeId,
    applicable: &[Operator],
) -> UserDefinedOutcome {
    match applicable {
        [] => return UserDefinedOutcome::None,
        [only] => return UserDefinedOutcome::Unique(only.method),
        _ => {}
    }
    let froms: Vec<TypeId> = applicable.iter().map(|op| op.from).collect();
    let tos: Vec<TypeId> = applicable.iter().map(|op| op.to).collect();

    // Most specific source: exact, else the most encompassed parameter type.
    let best_from = if froms.contains(&source) {
        Some(source)
    } else {
        unique_extreme(&froms, |a, b| classifier.standard(a, b).is_standard_implicit())
    };
    // Most specific target: exact, else the most encompassing return type.
    let best_to = if tos.contains(&target) {
        Some(target)
    } else {
        unique_extreme(&tos, |a, b| classifier.standard(b, a).is_standard_implicit())
    };

    let ambiguous = || UserDefinedOutcome::Ambiguous(applicable.iter().map(|op| op.method).collect());
    let (Some(best_from), Some(best_to)) = (best_from, best_to) else {
        return ambiguous();
    };
    let mut matching = applicable
        .iter()
        .filter(|op| op.from == best_from && op.to == best_to);
    match (matching.next(), matching.next()) {
        (Some(op), None) => UserDefinedOutcome::Unique(op.method),
        _ => ambiguous(),
    }
}

/// The single type that relates to every other type in `types` by `precedes`.
fn unique_extreme(types: &[TypeId], precedes: impl Fn(TypeId, TypeId) -> bool) -> Option<TypeId> {
    let distinct: IndexSet<TypeId> = types.iter().copied().collect();
    let mut winners = distinct
        .iter()
        .copied()
        .filter(|&candidate| distinct.iter().all(|&other| other == candidate || precedes(candidate, other)));
    match (winners.next(), winners.next()) {
        (Some(winner), None) => Some(winner),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/user_defined_tests.rs"]
mod tests;
