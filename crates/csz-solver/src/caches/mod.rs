//! Append-only memo tables shared by every body of one compilation.
//!
//! Entries are pure functions of their key, so a lookup that misses computes
//! the value without holding any lock and then inserts it only if the slot is
//! still empty. Two threads racing on the same key compute equal values and
//! the first insert wins; readers never observe a partially built entry.

pub(crate) mod query_trace;

use crate::class_hierarchy::{AccessContext, EffectiveMemberTable};
use crate::constructibility::ConstructibilityVerdict;
use crate::shape_locator::{ProtocolKind, ShapeQueryResult};
use crate::types::TypeId;
use dashmap::DashMap;
use serde::Serialize;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

pub type ShapeKey = (TypeId, ProtocolKind, AccessContext);
pub type VerdictKey = (TypeId, AccessContext);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub member_tables: usize,
    pub shapes: usize,
    pub verdicts: usize,
}

#[derive(Default)]
pub struct SolverCaches {
    member_tables: DashMap<TypeId, Arc<EffectiveMemberTable>>,
    shapes: DashMap<ShapeKey, ShapeQueryResult>,
    verdicts: DashMap<VerdictKey, ConstructibilityVerdict>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SolverCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member_table(
        &self,
        ty: TypeId,
        build: impl FnOnce() -> EffectiveMemberTable,
    ) -> Arc<EffectiveMemberTable> {
        self.get_or_insert(&self.member_tables, ty, "member_table", ty, "", || {
            Arc::new(build())
        })
    }

    pub fn shape(
        &self,
        key: ShapeKey,
        compute: impl FnOnce() -> ShapeQueryResult,
    ) -> ShapeQueryResult {
        self.get_or_insert(&self.shapes, key, "locate_shape", key.0, key.1.as_str(), compute)
    }

    pub fn verdict(
        &self,
        key: VerdictKey,
        compute: impl FnOnce() -> ConstructibilityVerdict,
    ) -> ConstructibilityVerdict {
        self.get_or_insert(&self.verdicts, key, "classify_constructibility", key.0, "", compute)
    }

    /// Peek at a cached verdict without computing it.
    pub fn cached_verdict(&self, key: &VerdictKey) -> Option<ConstructibilityVerdict> {
        self.verdicts.get(key).map(|r| r.clone())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            member_tables: self.member_tables.len(),
            shapes: self.shapes.len(),
            verdicts: self.verdicts.len(),
        }
    }

    fn get_or_insert<K, V>(
        &self,
        map: &DashMap<K, V>,
        key: K,
        op: &'static str,
        input: TypeId,
        qualifier: &'static str,
        compute: impl FnOnce() -> V,
    ) -> V
    where
        K: Eq + Hash,
        V: Clone,
    {
        let query_id = if query_trace::enabled() {
            let id = query_trace::next_query_id();
            query_trace::query_start(id, op, input, qualifier);
            Some(id)
        } else {
            None
        };

        if let Some(existing) = map.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if let Some(id) = query_id {
                query_trace::query_end(id, op, "cached", true);
            }
            return existing.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        // Computed without holding a shard lock: computing one entry may
        // query other entries of the same map.
        let value = compute();
        let stored = map.entry(key).or_insert(value).clone();
        trace!(op, input = input.0, "cache fill");
        if let Some(id) = query_id {
            query_trace::query_end(id, op, "computed", false);
        }
        stored
    }
}

#[cfg(test)]
#[path = "../../tests/caches_tests.rs"]
mod tests;
