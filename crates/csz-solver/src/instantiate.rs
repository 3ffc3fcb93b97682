//! Generic type instantiation.
//!
//! Member signatures are stored over their declaring type's own type
//! parameters (`List<T>.Add(T)`); looking a member up through `List<int>`
//! substitutes `T := int` into the signature.

use crate::db::TypeDatabase;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{TypeArgs, TypeData, TypeId, TypeParamId};
use rustc_hash::FxHashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeParamId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair parameters with arguments positionally; extra entries on either
    /// side are ignored.
    pub fn from_pairs(params: &[TypeParamId], args: &[TypeId]) -> Self {
        let map = params.iter().copied().zip(args.iter().copied()).collect();
        Self { map }
    }

    /// The substitution that maps a named type's definition parameters to its
    /// arguments. Empty for non-generic or non-named types.
    pub fn for_type(db: &dyn TypeDatabase, ty: TypeId) -> Self {
        match db.lookup(ty) {
            Some(TypeData::Named { def, args }) if !args.is_empty() => {
                Self::from_pairs(&db.defs().get_type_params(def), &args)
            }
            _ => Self::new(),
        }
    }

    pub fn insert(&mut self, param: TypeParamId, ty: TypeId) {
        self.map.insert(param, ty);
    }

    pub fn get(&self, param: TypeParamId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Merge `other` into `self`; existing entries are kept.
    pub fn extend(&mut self, other: &TypeSubstitution) {
        for (&param, &ty) in &other.map {
            self.map.entry(param).or_insert(ty);
        }
    }
}

/// Apply `subst` to `ty`.
pub fn instantiate_type(db: &dyn TypeDatabase, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    if subst.is_empty() || ty.is_intrinsic() {
        return ty;
    }
    let mut depth = DepthCounter::with_profile(RecursionProfile::Instantiation);
    instantiate_inner(db, ty, subst, &mut depth)
}

fn instantiate_inner(
    db: &dyn TypeDatabase,
    ty: TypeId,
    subst: &TypeSubstitution,
    depth: &mut DepthCounter,
) -> TypeId {
    if ty.is_intrinsic() {
        return ty;
    }
    let Some(data) = db.lookup(ty) else {
        return ty;
    };
    if !depth.enter() {
        return TypeId::ERROR;
    }
    let result = match data {
        TypeData::TypeParameter(param) => subst.get(param).unwrap_or(ty),
        TypeData::Named { def, args } => {
            if args.is_empty() {
                ty
            } else {
                let args: TypeArgs = args
                    .iter()
                    .map(|&a| instantiate_inner(db, a, subst, depth))
                    .collect();
                db.named(def, &args)
            }
        }
        TypeData::Array { element, rank } => {
            let element = instantiate_inner(db, element, subst, depth);
            db.array(element, rank)
        }
        TypeData::Pointer(inner) => {
            let inner = instantiate_inner(db, inner, subst, depth);
            db.pointer(inner)
        }
        TypeData::Nullable(inner) => {
            let inner = instantiate_inner(db, inner, subst, depth);
            db.nullable(inner)
        }
        TypeData::NullableRef(inner) => {
            let inner = instantiate_inner(db, inner, subst, depth);
            db.nullable_ref(inner)
        }
        TypeData::FunctionPointer { params, ret } => {
            let params: TypeArgs = params
                .iter()
                .map(|&p| instantiate_inner(db, p, subst, depth))
                .collect();
            let ret = instantiate_inner(db, ret, subst, depth);
            db.function_pointer(&params, ret)
        }
        TypeData::Intrinsic(_) => ty,
    };
    depth.leave();
    result
}

/// Does `ty` mention any type parameter?
pub fn contains_type_params(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    let mut depth = DepthCounter::with_profile(RecursionProfile::Instantiation);
    contains_inner(db, ty, &mut depth)
}

fn contains_inner(db: &dyn TypeDatabase, ty: TypeId, depth: &mut DepthCounter) -> bool {
    if ty.is_intrinsic() {
        return false;
    }
    let Some(data) = db.lookup(ty) else {
        return false;
    };
    if !depth.enter() {
        return false;
    }
    let found = match data {
        TypeData::TypeParameter(_) => true,
        TypeData::Named { args, .. } => args.iter().any(|&a| contains_inner(db, a, depth)),
        TypeData::Array { element, .. } => contains_inner(db, element, depth),
        TypeData::Pointer(inner) | TypeData::Nullable(inner) | TypeData::NullableRef(inner) => {
            contains_inner(db, inner, depth)
        }
        TypeData::FunctionPointer { params, ret } => {
            params.iter().any(|&p| contains_inner(db, p, depth)) || contains_inner(db, ret, depth)
        }
        TypeData::Intrinsic(_) => false,
    };
    depth.leave();
    found
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
