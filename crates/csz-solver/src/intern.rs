//! Type interning.
//!
//! Every `TypeData` is stored once; structurally equal requests return the
//! same `TypeId`. Intrinsic types occupy fixed ids below
//! `TypeId::FIRST_USER` so they can be named as constants.

use crate::types::{IntrinsicKind, TypeData, TypeId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{PoisonError, RwLock};

pub struct TypeInterner {
    map: DashMap<TypeData, TypeId>,
    /// Reverse table indexed by `TypeId`; slots below `FIRST_USER` that no
    /// intrinsic uses stay `None`.
    types: RwLock<Vec<Option<TypeData>>>,
}

impl TypeInterner {
    pub fn new() -> Self {
        let mut types: Vec<Option<TypeData>> = vec![None; TypeId::FIRST_USER as usize];
        let map = DashMap::new();
        for kind in IntrinsicKind::ALL {
            let id = kind.type_id();
            types[id.0 as usize] = Some(TypeData::Intrinsic(kind));
            map.insert(TypeData::Intrinsic(kind), id);
        }
        Self {
            map,
            types: RwLock::new(types),
        }
    }

    /// Intern `data`, returning the existing id when it is already known.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.map.get(&data) {
            return *id;
        }
        match self.map.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
                let id = TypeId(types.len() as u32);
                types.push(Some(entry.key().clone()));
                entry.insert(id);
                id
            }
        }
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.get(id.0 as usize).cloned().flatten()
    }

    /// Number of interned types, intrinsics included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
