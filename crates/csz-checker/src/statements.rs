//! Statement checking.

use crate::ast::{ExprId, StmtId, StmtKind};
use crate::context::CheckerState;
use crate::error::AnalysisError;
use csz_solver::TypeId;
use csz_solver::shape_locator::ProtocolKind;
use tracing::debug;

impl<'a> CheckerState<'a> {
    /// Check every top-level statement of the body, polling the cancellation
    /// token before each one.
    pub fn check_body(&mut self) -> Result<(), AnalysisError> {
        let body = self.body;
        for &stmt in body.statements() {
            if self.ctx.cancel.is_cancelled() {
                debug!(body = body.id.0, stmt = stmt.0, "analysis cancelled");
                return Err(AnalysisError::Cancelled);
            }
            self.check_stmt(stmt);
        }
        Ok(())
    }

    pub fn check_stmt(&mut self, stmt: StmtId) {
        let body = self.body;
        match &body.stmt(stmt).kind {
            StmtKind::Local { declared, init, .. } => {
                let Some(init) = *init else {
                    return;
                };
                match declared {
                    Some(ty) => {
                        self.convert_expr(init, *ty);
                    }
                    // `var`: the initializer has to stand on its own.
                    None => {
                        self.check_expr(init, None);
                    }
                }
            }
            StmtKind::Expr(expr) => {
                self.check_expr(*expr, None);
            }
            StmtKind::Return(value) => {
                if let Some(value) = *value {
                    match body.return_type {
                        Some(ty) if ty != TypeId::VOID => {
                            self.convert_expr(value, ty);
                        }
                        _ => {
                            self.check_expr(value, None);
                        }
                    }
                }
            }
            StmtKind::YieldReturn(value) => self.check_yield(*value),
            StmtKind::Lock { resource, body: block } => {
                self.check_lock_statement(stmt, *resource, block);
            }
            StmtKind::Block(stmts) => {
                for &inner in stmts {
                    self.check_stmt(inner);
                }
            }
        }
    }

    /// `yield return value;` converts to the iteration type of the
    /// iterator's declared return type.
    fn check_yield(&mut self, value: ExprId) {
        let element = self.body.return_type.and_then(|ty| {
            self.ctx
                .locate(ty, ProtocolKind::EnumeratorProducer)
                .as_enumerator()
                .map(|shape| shape.iteration_type)
        });
        match element {
            Some(element) => {
                self.convert_expr(value, element);
            }
            None => {
                self.check_expr(value, None);
            }
        }
    }
}
