//! Expression-level conversion classification.
//!
//! `csz_solver::conversions` answers type-to-type questions. Expressions add
//! three cases with no source type of their own: constants (narrowing), the
//! `null` literal, and collection literals, which convert to a target only
//! through its constructibility verdict.
//!
//! A literal's conversion never takes part in user-defined conversion search.
//! When the target has an implicit operator from the literal's would-be
//! natural type (`int[]` for `[1, 2]`) the answer is `UserDefinedExcluded`:
//! reported, never applied.

use crate::ast::{Body, CollectionElement, ExprId, ExprKind};
use crate::context::{CheckerContext, CheckerState};
use crate::expr::natural_type_of;
use csz_common::limits::MAX_LITERAL_NESTING_DEPTH;
use csz_solver::def::DefKind;
use csz_solver::overload::ArgumentSource;
use csz_solver::shape_locator::ProtocolKind;
use csz_solver::user_defined::find_implicit_user_defined;
use csz_solver::{Conversion, TypeId};
use tracing::trace;

/// How `expr` converts to `target`.
pub fn classify_expr_conversion(
    ctx: &CheckerContext<'_>,
    body: &Body,
    expr: ExprId,
    target: TypeId,
) -> Conversion {
    classify_at_depth(ctx, body, expr, target, 0)
}

fn classify_at_depth(
    ctx: &CheckerContext<'_>,
    body: &Body,
    expr: ExprId,
    target: TypeId,
    depth: u32,
) -> Conversion {
    match &body.expr(expr).kind {
        ExprKind::CollectionLiteral { elements, .. } => {
            literal_conversion(ctx, body, elements, target, depth)
        }
        ExprKind::Constant(value) => ctx.with_classifier(|c| c.classify_constant(value, target)),
        ExprKind::Lambda { .. } => match ctx.db.def_of(target) {
            Some(def) if ctx.db.defs().get_kind(def) == Some(DefKind::Delegate) => {
                Conversion::ImplicitReference
            }
            _ if target.is_error() => Conversion::Identity,
            _ => Conversion::NoConversion,
        },
        ExprKind::Error => Conversion::Identity,
        _ => match natural_type_of(body, expr) {
            Some(source) => ctx.classify_types(source, target),
            None => Conversion::NoConversion,
        },
    }
}

fn literal_conversion(
    ctx: &CheckerContext<'_>,
    body: &Body,
    elements: &[CollectionElement],
    target: TypeId,
    depth: u32,
) -> Conversion {
    if depth > MAX_LITERAL_NESTING_DEPTH {
        return Conversion::NoConversion;
    }
    if target.is_error() {
        return Conversion::Identity;
    }
    let verdict = ctx.classify_target(target);
    if let Some(element) = verdict.element_type() {
        let converts = elements.iter().all(|&item| match item {
            CollectionElement::Expr(e) => {
                classify_at_depth(ctx, body, e, element, depth + 1).is_implicit()
            }
            CollectionElement::Spread(e) => spread_iteration_type(ctx, body, e)
                .is_some_and(|it| ctx.classify_types(it, element).is_implicit()),
        });
        if converts {
            return Conversion::CollectionLiteral;
        }
    }
    let excluded = would_be_natural_type(ctx, body, elements).is_some_and(|natural| {
        ctx.with_classifier(|c| find_implicit_user_defined(c, natural, target).exists())
    });
    trace!(
        target = target.0,
        constructible = verdict.is_constructible(),
        excluded,
        "collection literal has no conversion"
    );
    if excluded {
        Conversion::UserDefinedExcluded
    } else {
        Conversion::NoConversion
    }
}

/// Iteration type of a spread source, when its enumerator shape is found.
pub(crate) fn spread_iteration_type(
    ctx: &CheckerContext<'_>,
    body: &Body,
    source: ExprId,
) -> Option<TypeId> {
    let ty = natural_type_of(body, source)?;
    ctx.locate(ty, ProtocolKind::EnumeratorProducer)
        .as_enumerator()
        .map(|shape| shape.iteration_type)
}

/// The array type the literal would have if literals had natural types:
/// every element (or spread iteration type) agrees on one type.
pub fn would_be_natural_type(
    ctx: &CheckerContext<'_>,
    body: &Body,
    elements: &[CollectionElement],
) -> Option<TypeId> {
    let mut common: Option<TypeId> = None;
    for &item in elements {
        let ty = match item {
            CollectionElement::Expr(e) => natural_type_of(body, e)?,
            CollectionElement::Spread(e) => spread_iteration_type(ctx, body, e)?,
        };
        match common {
            None => common = Some(ty),
            Some(existing) if existing == ty => {}
            Some(_) => return None,
        }
    }
    common.map(|element| ctx.db.array(element, 1))
}

impl<'a> CheckerState<'a> {
    /// Classify without reporting. `None` target means no target type.
    pub fn classify_conversion(&self, expr: ExprId, target: Option<TypeId>) -> Conversion {
        match target {
            Some(target) => classify_expr_conversion(&self.ctx, self.body, expr, target),
            None => Conversion::NoConversion,
        }
    }
}

// =============================================================================
// Arguments for overload resolution
// =============================================================================

/// Call arguments given as expressions. Literals and `null` have no type of
/// their own and are classified per candidate parameter.
pub struct ExprArguments<'s, 'a> {
    ctx: &'s CheckerContext<'a>,
    body: &'s Body,
    args: &'s [ExprId],
}

impl<'s, 'a> ExprArguments<'s, 'a> {
    pub fn new(ctx: &'s CheckerContext<'a>, body: &'s Body, args: &'s [ExprId]) -> Self {
        Self { ctx, body, args }
    }
}

impl ArgumentSource for ExprArguments<'_, '_> {
    fn arg_count(&self) -> usize {
        self.args.len()
    }

    fn arg_type(&self, index: usize) -> Option<TypeId> {
        natural_type_of(self.body, *self.args.get(index)?)
    }

    fn conversion_to(&self, index: usize, target: TypeId) -> Conversion {
        match self.args.get(index) {
            Some(&arg) => classify_expr_conversion(self.ctx, self.body, arg, target),
            None => Conversion::NoConversion,
        }
    }
}
