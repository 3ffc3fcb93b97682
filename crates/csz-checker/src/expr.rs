//! Expression typing.
//!
//! Every expression is checked against an optional expected type. Collection
//! literals are the only expressions whose type comes entirely from that
//! expectation; everything else has a natural type and is converted to the
//! expectation afterwards.

use crate::ast::{Body, ExprId, ExprKind};
use crate::context::CheckerState;
use csz_common::diagnostics::diagnostic_codes;
use csz_solver::{Conversion, TypeId};
use tracing::trace;

/// The type an expression has on its own. Collection literals, `null` and
/// lambdas have none.
pub fn natural_type_of(body: &Body, expr: ExprId) -> Option<TypeId> {
    match &body.expr(expr).kind {
        ExprKind::Constant(value) => value.natural_type(),
        ExprKind::Local { ty, .. } => Some(*ty),
        ExprKind::Call { result, .. } => Some(*result),
        ExprKind::ObjectCreation { ty, .. } => Some(*ty),
        ExprKind::Cast { target, .. } => Some(*target),
        ExprKind::Await(inner) => natural_type_of(body, *inner),
        ExprKind::CollectionLiteral { .. } | ExprKind::Lambda { .. } => None,
        ExprKind::Error => Some(TypeId::ERROR),
    }
}

impl<'a> CheckerState<'a> {
    pub fn natural_type(&self, expr: ExprId) -> Option<TypeId> {
        natural_type_of(self.body, expr)
    }

    /// Check `expr` and return the type it ends up with.
    pub fn check_expr(&mut self, expr: ExprId, expected: Option<TypeId>) -> TypeId {
        let body = self.body;
        let ty = match &body.expr(expr).kind {
            ExprKind::CollectionLiteral { .. } => self.check_collection_literal(expr, expected),
            ExprKind::ObjectCreation { .. } => self.check_object_creation(expr),
            ExprKind::Cast { target, operand } => {
                self.check_cast(*target, *operand);
                *target
            }
            ExprKind::Await(inner) => self.check_expr(*inner, expected),
            ExprKind::Call { args, result, .. } => {
                for &arg in args {
                    self.check_expr(arg, None);
                }
                *result
            }
            ExprKind::Lambda {
                body: lambda_body,
                return_type,
                expression_tree,
            } => {
                self.check_lambda(*lambda_body, *return_type, *expression_tree);
                expected.unwrap_or(TypeId::ERROR)
            }
            ExprKind::Constant(value) => value.natural_type().unwrap_or(TypeId::NULL),
            ExprKind::Local { ty, .. } => *ty,
            ExprKind::Error => TypeId::ERROR,
        };
        self.ctx
            .facts
            .record_natural_type((body.id, expr), natural_type_of(body, expr));
        ty
    }

    /// Check `expr` and convert it to `target`, reporting a missing implicit
    /// conversion and the monitor-fallback advisory.
    pub fn convert_expr(&mut self, expr: ExprId, target: TypeId) -> Conversion {
        let body = self.body;
        let key = (body.id, expr);
        if body.is_collection_literal(expr) {
            self.check_collection_literal(expr, Some(target));
            let conversion = self
                .ctx
                .facts
                .literal(key)
                .map_or(Conversion::NoConversion, |facts| facts.conversion);
            self.ctx.facts.record_conversion(key, conversion);
            return conversion;
        }

        let source = self.check_expr(expr, Some(target));
        let conversion = self.classify_conversion(expr, Some(target));
        let span = self.expr_span(expr);
        if !conversion.is_implicit() && !source.is_error() {
            self.ctx.error(
                diagnostic_codes::CANNOT_IMPLICITLY_CONVERT_TYPE,
                span,
                vec![source.into(), target.into()],
            );
        }
        if conversion == Conversion::LockScopeToReference {
            self.ctx.warning(
                diagnostic_codes::CONVERTING_LOCK_TO_OTHER_TYPE,
                span,
                vec![source.into()],
            );
        }
        trace!(
            expr = expr.0,
            target = target.0,
            conversion = conversion.as_str(),
            "converted expression"
        );
        self.ctx.facts.record_conversion(key, conversion);
        conversion
    }

    /// `(T)operand`. A literal operand takes `T` as its target; other
    /// operands only need some conversion, explicit ones included.
    fn check_cast(&mut self, target: TypeId, operand: ExprId) {
        let body = self.body;
        if body.is_collection_literal(operand) {
            self.convert_expr(operand, target);
            return;
        }
        let source = self.check_expr(operand, None);
        let conversion = self.classify_conversion(operand, Some(target));
        if conversion == Conversion::NoConversion && !source.is_error() && !target.is_error() {
            self.ctx.error(
                diagnostic_codes::CANNOT_CONVERT_TYPE,
                self.expr_span(operand),
                vec![source.into(), target.into()],
            );
        }
        if conversion == Conversion::LockScopeToReference {
            self.ctx.warning(
                diagnostic_codes::CONVERTING_LOCK_TO_OTHER_TYPE,
                self.expr_span(operand),
                vec![source.into()],
            );
        }
        self.ctx.facts.record_conversion((body.id, operand), conversion);
    }

    fn check_lambda(&mut self, lambda_body: ExprId, return_type: Option<TypeId>, expression_tree: bool) {
        if expression_tree {
            self.ctx.expression_tree_depth += 1;
        }
        match return_type {
            Some(ty) if ty != TypeId::VOID => {
                self.convert_expr(lambda_body, ty);
            }
            _ => {
                self.check_expr(lambda_body, None);
            }
        }
        if expression_tree {
            self.ctx.expression_tree_depth -= 1;
        }
    }
}
