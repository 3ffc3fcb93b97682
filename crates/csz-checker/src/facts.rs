//! Semantic facts: what the checker concluded about each node.
//!
//! The AST is never annotated in place. Everything tooling or the emitter
//! may ask for afterwards is recorded here, keyed by `(BodyId, ExprId)` or
//! `(BodyId, StmtId)`. Lowering plans are stored once and taken once.

use crate::ast::{BodyId, ExprId, StmtId};
use crate::lowering::LoweringPlan;
use csz_solver::constructibility::ConstructibilityVerdict;
use csz_solver::shape_locator::ShapeQueryResult;
use csz_solver::{Conversion, TypeId};
use rustc_hash::FxHashMap;
use serde::Serialize;

pub type ExprKey = (BodyId, ExprId);
pub type StmtKey = (BodyId, StmtId);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralFacts {
    /// `None` when the literal had no target type.
    pub target: Option<TypeId>,
    pub verdict: Option<ConstructibilityVerdict>,
    pub conversion: Conversion,
    /// Type each element converted to, in element order.
    pub element_types: Vec<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LockPlanKind {
    ScopeEnterDispose,
    MonitorFallback,
    /// The statement was rejected; nothing to lower.
    Invalid,
}

impl LockPlanKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            LockPlanKind::ScopeEnterDispose => "scope_enter_dispose",
            LockPlanKind::MonitorFallback => "monitor_fallback",
            LockPlanKind::Invalid => "invalid",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockFacts {
    pub resource_type: TypeId,
    pub producer: ShapeQueryResult,
    /// `NotFound` when there was no producer to look on.
    pub disposer: ShapeQueryResult,
    pub plan_kind: LockPlanKind,
}

#[derive(Debug, Default)]
pub struct SemanticFacts {
    literals: FxHashMap<ExprKey, LiteralFacts>,
    conversions: FxHashMap<ExprKey, Conversion>,
    natural_types: FxHashMap<ExprKey, Option<TypeId>>,
    locks: FxHashMap<StmtKey, LockFacts>,
    literal_plans: FxHashMap<ExprKey, LoweringPlan>,
    lock_plans: FxHashMap<StmtKey, LoweringPlan>,
}

impl SemanticFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_literal(&mut self, key: ExprKey, facts: LiteralFacts) {
        self.literals.insert(key, facts);
    }

    pub fn literal(&self, key: ExprKey) -> Option<&LiteralFacts> {
        self.literals.get(&key)
    }

    pub fn record_conversion(&mut self, key: ExprKey, conversion: Conversion) {
        self.conversions.insert(key, conversion);
    }

    pub fn conversion(&self, key: ExprKey) -> Option<Conversion> {
        self.conversions.get(&key).copied()
    }

    pub fn record_natural_type(&mut self, key: ExprKey, ty: Option<TypeId>) {
        self.natural_types.insert(key, ty);
    }

    /// The natural type of an analysed expression. The outer `None` means the
    /// expression was not analysed; `Some(None)` means it has no natural type
    /// (collection literals, `null`, lambdas).
    pub fn natural_type(&self, key: ExprKey) -> Option<Option<TypeId>> {
        self.natural_types.get(&key).copied()
    }

    pub fn record_lock(&mut self, key: StmtKey, facts: LockFacts) {
        self.locks.insert(key, facts);
    }

    pub fn lock(&self, key: StmtKey) -> Option<&LockFacts> {
        self.locks.get(&key)
    }

    pub fn store_literal_plan(&mut self, key: ExprKey, plan: LoweringPlan) {
        self.literal_plans.insert(key, plan);
    }

    pub fn store_lock_plan(&mut self, key: StmtKey, plan: LoweringPlan) {
        self.lock_plans.insert(key, plan);
    }

    pub fn peek_plan(&self, key: ExprKey) -> Option<&LoweringPlan> {
        self.literal_plans.get(&key)
    }

    pub fn peek_lock_plan(&self, key: StmtKey) -> Option<&LoweringPlan> {
        self.lock_plans.get(&key)
    }

    /// Hand a literal's plan to the emitter. A second call returns `None`.
    pub fn take_plan(&mut self, key: ExprKey) -> Option<LoweringPlan> {
        self.literal_plans.remove(&key)
    }

    pub fn take_lock_plan(&mut self, key: StmtKey) -> Option<LoweringPlan> {
        self.lock_plans.remove(&key)
    }

    /// Literal facts ordered by node.
    pub fn literals(&self) -> Vec<(ExprKey, &LiteralFacts)> {
        let mut entries: Vec<_> = self.literals.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    pub fn literal_plans(&self) -> Vec<(ExprKey, &LoweringPlan)> {
        let mut entries: Vec<_> = self.literal_plans.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    pub fn lock_plans(&self) -> Vec<(StmtKey, &LoweringPlan)> {
        let mut entries: Vec<_> = self.lock_plans.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    pub fn literal_count(&self) -> usize {
        self.literals.len()
    }

    pub fn plan_count(&self) -> usize {
        self.literal_plans.len() + self.lock_plans.len()
    }

    /// Fold another body's facts into this table. Keys never collide across
    /// bodies.
    pub fn merge(&mut self, other: SemanticFacts) {
        self.literals.extend(other.literals);
        self.conversions.extend(other.conversions);
        self.natural_types.extend(other.natural_types);
        self.locks.extend(other.locks);
        self.literal_plans.extend(other.literal_plans);
        self.lock_plans.extend(other.lock_plans);
    }
}
