//! Collection initializers: `new C(args) { e1, e2 }`.
//!
//! Binds through the same constructor resolution and adder machinery as
//! collection literals, so `new List<int>() { 1 }` and `List<int> x = [1]`
//! call the same members. The constructibility verdict is not consulted: an
//! initializer names its type and constructor explicitly.

use crate::ast::{CollectionElement, ExprId, ExprKind};
use crate::collection_literal::{BoundCollection, CollectionStrategy};
use crate::context::CheckerState;
use crate::lowering::LoweringPlanner;
use csz_common::diagnostics::diagnostic_codes;
use csz_solver::class_hierarchy::implements_interface;
use csz_solver::shape_locator::ProtocolKind;
use csz_solver::{ResolvedMethod, TypeId, WellKnownType};
use std::sync::Arc;
use tracing::debug;

impl<'a> CheckerState<'a> {
    pub fn check_object_creation(&mut self, expr: ExprId) -> TypeId {
        let ExprKind::ObjectCreation { ty, .. } = &self.body.expr(expr).kind else {
            return TypeId::ERROR;
        };
        let ty = *ty;
        if let Some(bound) = self.bind_object_creation(expr) {
            if bound.is_clean() {
                let plan = LoweringPlanner::new(self.ctx.db).plan(&bound);
                self.ctx.facts.store_literal_plan((self.body.id, expr), plan);
            }
        }
        ty
    }

    /// Bind `new C(args) { ... }`. Returns `None` when the constructor or the
    /// initializer could not be bound.
    pub fn bind_object_creation(&mut self, expr: ExprId) -> Option<BoundCollection> {
        let body = self.body;
        let node = body.expr(expr);
        let ExprKind::ObjectCreation {
            ty,
            args,
            initializer,
        } = &node.kind
        else {
            return None;
        };
        let ty = *ty;
        let span = node.span;
        let items: &[ExprId] = initializer.as_deref().unwrap_or(&[]);

        if ty.is_error() {
            for &e in args.iter().chain(items) {
                if !body.is_collection_literal(e) {
                    self.check_expr(e, None);
                }
            }
            return None;
        }

        let constructor = self.resolve_constructor(ty, args, span);

        if initializer.is_some() && !self.implements_enumerable_marker(ty) {
            self.ctx.error(
                diagnostic_codes::COLLECTION_INIT_REQUIRES_ENUMERABLE,
                span,
                vec![ty.into()],
            );
            for &e in items {
                if !body.is_collection_literal(e) {
                    self.check_expr(e, None);
                }
            }
            return None;
        }

        let strategy = CollectionStrategy::Construct {
            collection_type: ty,
            constructor: constructor.clone().flatten(),
            constructor_args: args.clone(),
            add_range: None,
        };
        let adders: Arc<[ResolvedMethod]> = if items.is_empty() {
            Arc::from(Vec::new())
        } else {
            self.ctx
                .locate(ty, ProtocolKind::Adder)
                .as_adders()
                .cloned()
                .unwrap_or_else(|| Arc::from(Vec::new()))
        };
        let elements: Vec<CollectionElement> =
            items.iter().map(|&e| CollectionElement::Expr(e)).collect();
        let bound_elements = self.bind_elements(&elements, &strategy, &adders, ty);
        debug!(
            expr = expr.0,
            ty = ty.0,
            elements = bound_elements.len(),
            constructed = constructor.is_some(),
            "bound object creation"
        );

        constructor?;
        Some(BoundCollection {
            node: expr,
            span,
            target: ty,
            verdict: None,
            strategy,
            elements: bound_elements,
        })
    }

    fn implements_enumerable_marker(&self, ty: TypeId) -> bool {
        let db = self.ctx.db;
        db.well_known_type(WellKnownType::IEnumerable, &[])
            .is_some_and(|marker| implements_interface(db, ty, marker))
    }
}
