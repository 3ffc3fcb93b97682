//! `lock (resource) { ... }`
//!
//! A resource whose type has a scope producer (`EnterScope()` returning a
//! ref struct) whose result has a scope disposer (`Dispose()`) takes the
//! structural path: enter a scope, run the body, dispose the scope. Any other
//! reference type falls back to `Monitor.Enter` / `Monitor.Exit`. Value types
//! cannot be locked.
//!
//! The well-known `System.Threading.Lock` never falls back silently: if the
//! library lacks either scope member, that is a missing compiler-required
//! member.

use crate::ast::{ExprId, StmtId};
use crate::context::CheckerState;
use crate::facts::{LockFacts, LockPlanKind};
use crate::lowering::LoweringPlanner;
use csz_common::diagnostics::diagnostic_codes;
use csz_common::span::Span;
use csz_solver::class_hierarchy::{is_reference_type, strip_nullable_ref};
use csz_solver::shape_locator::{ProtocolKind, ShapeQueryResult};
use csz_solver::well_known::lookup_member;
use csz_solver::{MethodId, ResolvedMethod, TypeId, WellKnownMember, WellKnownType};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundLock {
    pub stmt: StmtId,
    pub resource: ExprId,
    pub resource_type: TypeId,
    pub strategy: LockStrategy,
    /// The body contains `await` or `yield`.
    pub crosses_suspension: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LockStrategy {
    Scope {
        producer: ResolvedMethod,
        disposer: ResolvedMethod,
    },
    Monitor {
        enter: MethodId,
        exit: MethodId,
    },
}

impl LockStrategy {
    pub const fn plan_kind(&self) -> LockPlanKind {
        match self {
            LockStrategy::Scope { .. } => LockPlanKind::ScopeEnterDispose,
            LockStrategy::Monitor { .. } => LockPlanKind::MonitorFallback,
        }
    }
}

impl<'a> CheckerState<'a> {
    pub fn check_lock_statement(&mut self, stmt: StmtId, resource: ExprId, block: &[StmtId]) {
        let key = (self.body.id, stmt);
        let (facts, bound) = self.bind_lock(stmt, resource, block);
        debug!(
            stmt = stmt.0,
            resource_type = facts.resource_type.0,
            producer = facts.producer.outcome_str(),
            disposer = facts.disposer.outcome_str(),
            plan = facts.plan_kind.as_str(),
            "bound lock statement"
        );
        self.ctx.facts.record_lock(key, facts);
        if let Some(bound) = bound {
            let plan = LoweringPlanner::new(self.ctx.db).plan_lock(&bound);
            self.ctx.facts.store_lock_plan(key, plan);
        }

        for &inner in block {
            self.check_stmt(inner);
        }
    }

    /// Pick the lock strategy. Diagnostics are reported here; the body is
    /// checked by the caller.
    pub fn bind_lock(
        &mut self,
        stmt: StmtId,
        resource: ExprId,
        block: &[StmtId],
    ) -> (LockFacts, Option<BoundLock>) {
        let body = self.body;
        let resource_type = self.check_expr(resource, None);
        let resource_span = self.expr_span(resource);
        let invalid = |producer: ShapeQueryResult, disposer: ShapeQueryResult| LockFacts {
            resource_type,
            producer,
            disposer,
            plan_kind: LockPlanKind::Invalid,
        };
        if resource_type.is_error() {
            return (
                invalid(ShapeQueryResult::NotFound, ShapeQueryResult::NotFound),
                None,
            );
        }

        let producer = self.ctx.locate(resource_type, ProtocolKind::ScopeProducer);
        let disposer = match producer.as_method() {
            Some(method) => self.ctx.locate(method.return_type, ProtocolKind::ScopeDisposer),
            None => ShapeQueryResult::NotFound,
        };

        let scope = match (producer.as_method(), disposer.as_method()) {
            (Some(enter), Some(dispose)) => Some((enter.clone(), dispose.clone())),
            _ => None,
        };
        let strategy = match scope {
            Some((enter, dispose)) => {
                self.check_member_feature(&enter, resource_span);
                LockStrategy::Scope {
                    producer: enter,
                    disposer: dispose,
                }
            }
            _ if self.is_well_known_lock(resource_type) => {
                let missing = if producer.is_found() {
                    WellKnownMember::LockScopeDispose
                } else {
                    WellKnownMember::LockEnterScope
                };
                self.report_missing_member(missing, resource_span);
                return (invalid(producer, disposer), None);
            }
            _ if self.is_lockable(resource_type) => {
                let db = self.ctx.db;
                let enter = lookup_member(db, WellKnownMember::MonitorEnter);
                let exit = lookup_member(db, WellKnownMember::MonitorExit);
                let (Some(enter), Some(exit)) = (enter, exit) else {
                    let missing = if enter.is_none() {
                        WellKnownMember::MonitorEnter
                    } else {
                        WellKnownMember::MonitorExit
                    };
                    self.report_missing_member(missing, resource_span);
                    return (invalid(producer, disposer), None);
                };
                if let Some(await_expr) = body.first_await(block) {
                    self.ctx.error(
                        diagnostic_codes::BAD_AWAIT_IN_LOCK,
                        self.expr_span(await_expr),
                        Vec::new(),
                    );
                }
                LockStrategy::Monitor { enter, exit }
            }
            _ => {
                self.ctx.error(
                    diagnostic_codes::LOCK_NEEDS_REFERENCE_TYPE,
                    resource_span,
                    vec![resource_type.into()],
                );
                return (invalid(producer, disposer), None);
            }
        };

        let facts = LockFacts {
            resource_type,
            producer,
            disposer,
            plan_kind: strategy.plan_kind(),
        };
        let bound = BoundLock {
            stmt,
            resource,
            resource_type,
            strategy,
            crosses_suspension: body.contains_suspension(block),
        };
        (facts, Some(bound))
    }

    fn is_well_known_lock(&self, ty: TypeId) -> bool {
        let db = self.ctx.db;
        matches!(
            db.well_known_of(strip_nullable_ref(db, ty)),
            Some((WellKnownType::Lock, _))
        )
    }

    /// Reference types other than the `null` literal's type. Type parameters
    /// qualify only with a reference-type constraint.
    fn is_lockable(&self, ty: TypeId) -> bool {
        ty != TypeId::NULL && is_reference_type(self.ctx.db, ty)
    }

    fn report_missing_member(&mut self, member: WellKnownMember, span: Span) {
        self.ctx.error(
            diagnostic_codes::MISSING_PREDEFINED_MEMBER,
            span,
            vec![member.container_display().into(), member.member_name().into()],
        );
    }
}

#[cfg(test)]
#[path = "../tests/lock_strategy_tests.rs"]
mod tests;
