//! Element/Spread Binder.
//!
//! Binds a collection literal against its target type. The constructibility
//! verdict picks the strategy; each element is then bound in source order,
//! either by conversion to the element type (arrays, spans, builder-created
//! collections) or through an adder chosen by overload resolution (every
//! other collection). Spreads
//! bind through the enumerator shape of their source.
//!
//! The result is a [`BoundCollection`]. The outermost literal's bound tree is
//! handed to the planner; nested literals stay inside it as values.

use crate::ast::{CollectionElement, ExprId, ExprKind};
use crate::context::CheckerState;
use crate::conversion_classifier::ExprArguments;
use crate::facts::{ExprKey, LiteralFacts};
use crate::lowering::LoweringPlanner;
use crate::nullability::NullabilityFact;
use csz_common::diagnostics::diagnostic_codes;
use csz_common::language::Feature;
use csz_common::span::Span;
use csz_solver::class_hierarchy::{
    is_accessible, is_reference_type, member_table, strip_nullable_ref,
};
use csz_solver::constructibility::{ConstructibilityVerdict, NotConstructibleReason};
use csz_solver::diagnostics::DiagnosticArg;
use csz_solver::overload::TypedArguments;
use csz_solver::shape_locator::{EnumeratorShape, ProtocolKind};
use csz_solver::types::{ConstantValue, TypeData};
use csz_solver::well_known::lookup_member;
use csz_solver::{Conversion, OverloadResult, ResolvedMethod, TypeId, WellKnownMember, WellKnownType};
use tracing::{debug, trace};

// =============================================================================
// Bound tree
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct BoundCollection {
    pub node: ExprId,
    pub span: Span,
    pub target: TypeId,
    /// `None` for object-creation initializers, which bypass the verdict.
    pub verdict: Option<ConstructibilityVerdict>,
    pub strategy: CollectionStrategy,
    pub elements: Vec<BoundElement>,
}

impl BoundCollection {
    /// Every element bound without error and the strategy is complete.
    pub fn is_clean(&self) -> bool {
        self.strategy.is_complete() && self.elements.iter().all(BoundElement::is_ok)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CollectionStrategy {
    Array {
        array_type: TypeId,
        element: TypeId,
    },
    Span {
        span_type: TypeId,
        element: TypeId,
        readonly: bool,
        constructor: ResolvedMethod,
    },
    /// Construct, then add each element.
    Construct {
        collection_type: TypeId,
        /// `None` for an implicit parameterless constructor.
        constructor: Option<ResolvedMethod>,
        constructor_args: Vec<ExprId>,
        /// `List<T>.AddRange`, when the collection is a `List<T>`.
        add_range: Option<ResolvedMethod>,
    },
    /// Gather the elements into a `ReadOnlySpan<T>` and pass it to the
    /// builder's `Create`.
    Builder {
        collection_type: TypeId,
        element: TypeId,
        span_type: TypeId,
        span_constructor: ResolvedMethod,
        /// `None` when no overload fits the `with(...)` arguments.
        create: Option<ResolvedMethod>,
        builder_args: Vec<ExprId>,
    },
}

impl CollectionStrategy {
    /// Element type for strategies that store by conversion.
    pub fn element_target(&self) -> Option<TypeId> {
        match self {
            CollectionStrategy::Array { element, .. }
            | CollectionStrategy::Span { element, .. }
            | CollectionStrategy::Builder { element, .. } => Some(*element),
            CollectionStrategy::Construct { .. } => None,
        }
    }

    /// A builder strategy needs a `Create` overload to call.
    pub fn is_complete(&self) -> bool {
        match self {
            CollectionStrategy::Builder { create, .. } => create.is_some(),
            _ => true,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            CollectionStrategy::Array { .. } => "array",
            CollectionStrategy::Span { .. } => "span",
            CollectionStrategy::Construct { .. } => "construct",
            CollectionStrategy::Builder { .. } => "builder",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundElement {
    /// Position in the literal.
    pub order: u32,
    pub span: Span,
    /// The type the element converts to; `ERROR` when binding failed.
    pub element_type: TypeId,
    pub conversion: Conversion,
    pub kind: BoundElementKind,
}

impl BoundElement {
    pub fn is_ok(&self) -> bool {
        !self.element_type.is_error()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoundElementKind {
    Expr {
        value: BoundValue,
        adder: Option<ResolvedMethod>,
    },
    Spread {
        source: ExprId,
        source_type: TypeId,
        iteration_type: TypeId,
        spread: SpreadKind,
        enumerator: Option<EnumeratorShape>,
        adder: Option<ResolvedMethod>,
        /// The whole source can go through `AddRange` in one call.
        bulk_compatible: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum BoundValue {
    Constant(ConstantValue),
    Expr(ExprId),
    Nested(Box<BoundCollection>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpreadKind {
    /// Length is known before enumeration.
    Countable,
    GeneralEnumerable,
}

impl SpreadKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SpreadKind::Countable => "countable",
            SpreadKind::GeneralEnumerable => "enumerable",
        }
    }
}

/// The single argument of an adder call.
#[derive(Clone, Copy)]
pub(crate) enum AdderArgument {
    Expr(ExprId),
    /// A spread's iteration type.
    Typed(TypeId),
}

// =============================================================================
// Binding
// =============================================================================

impl<'a> CheckerState<'a> {
    /// Check an outermost collection literal and store its lowering plan.
    pub fn check_collection_literal(&mut self, expr: ExprId, target: Option<TypeId>) -> TypeId {
        let Some(bound) = self.bind_collection_literal(expr, target) else {
            return TypeId::ERROR;
        };
        if bound.is_clean() {
            let plan = LoweringPlanner::new(self.ctx.db).plan(&bound);
            self.ctx.facts.store_literal_plan((self.body.id, expr), plan);
        }
        bound.target
    }

    /// Bind a literal against `target`. Returns `None` when the literal could
    /// not be bound at all; diagnostics and facts are recorded either way.
    pub fn bind_collection_literal(
        &mut self,
        expr: ExprId,
        target: Option<TypeId>,
    ) -> Option<BoundCollection> {
        let body = self.body;
        let node = body.expr(expr);
        let ExprKind::CollectionLiteral { elements, with_args } = &node.kind else {
            return None;
        };
        let key = (body.id, expr);
        let span = node.span;
        self.ctx.facts.record_natural_type(key, None);

        self.require_feature(Feature::CollectionExpressions, span);
        if self.ctx.in_expression_tree() {
            self.ctx.error(
                diagnostic_codes::EXPRESSION_TREE_CONTAINS_COLLECTION_EXPRESSION,
                span,
                Vec::new(),
            );
        }

        let Some(target) = target.filter(|&t| !self.is_unconstrained_type_param(t)) else {
            self.ctx
                .error(diagnostic_codes::COLLECTION_EXPRESSION_NO_TARGET_TYPE, span, Vec::new());
            self.record_unbound_literal(key, elements, with_args.as_deref(), None, None, Conversion::NoConversion);
            return None;
        };
        if target.is_error() {
            self.record_unbound_literal(
                key,
                elements,
                with_args.as_deref(),
                Some(target),
                None,
                Conversion::Identity,
            );
            return None;
        }

        let verdict = self.ctx.classify_target(target);
        if let Some(reason) = verdict.reason() {
            self.report_not_constructible(target, reason, span);
            let conversion = self.classify_conversion(expr, Some(target));
            self.record_unbound_literal(
                key,
                elements,
                with_args.as_deref(),
                Some(target),
                Some(verdict),
                conversion,
            );
            return None;
        }

        if !self.ctx.literal_depth.enter() {
            debug!(depth = self.ctx.literal_depth.depth(), "collection literal nesting limit reached");
            self.record_unbound_literal(
                key,
                &[],
                None,
                Some(target),
                Some(verdict),
                Conversion::NoConversion,
            );
            return None;
        }
        let bound = self.bind_constructible(expr, span, target, verdict, elements, with_args.as_deref());
        self.ctx.literal_depth.leave();
        Some(bound)
    }

    fn bind_constructible(
        &mut self,
        expr: ExprId,
        span: Span,
        target: TypeId,
        verdict: ConstructibilityVerdict,
        elements: &[CollectionElement],
        with_args: Option<&[ExprId]>,
    ) -> BoundCollection {
        let mut strategy = self.strategy_for(target, &verdict);
        match with_args {
            Some(args) => {
                let chosen = self.bind_collection_arguments(target, &verdict, args, span);
                match (&mut strategy, chosen) {
                    (
                        CollectionStrategy::Construct {
                            constructor,
                            constructor_args,
                            ..
                        },
                        Some(chosen),
                    ) => {
                        *constructor = chosen;
                        *constructor_args = args.to_vec();
                    }
                    (
                        CollectionStrategy::Builder {
                            create,
                            builder_args,
                            ..
                        },
                        chosen,
                    ) => {
                        *create = chosen.flatten();
                        *builder_args = args.to_vec();
                    }
                    _ => {}
                }
            }
            None => {
                if let CollectionStrategy::Builder {
                    element,
                    create: None,
                    ..
                } = &strategy
                {
                    self.report_builder_method_not_found(target, *element, span);
                }
            }
        }

        let adders = verdict.adders().cloned();
        let adders: &[ResolvedMethod] = adders.as_deref().unwrap_or(&[]);
        let bound_elements = self.bind_elements(elements, &strategy, adders, target);

        let clean = strategy.is_complete() && bound_elements.iter().all(BoundElement::is_ok);
        let facts = LiteralFacts {
            target: Some(target),
            verdict: Some(verdict.clone()),
            conversion: if clean {
                Conversion::CollectionLiteral
            } else {
                Conversion::NoConversion
            },
            element_types: bound_elements.iter().map(|e| e.element_type).collect(),
        };
        debug!(
            expr = expr.0,
            target = target.0,
            verdict = verdict.kind_str(),
            strategy = strategy.as_str(),
            elements = bound_elements.len(),
            clean,
            "bound collection literal"
        );
        self.ctx.facts.record_literal((self.body.id, expr), facts);

        BoundCollection {
            node: expr,
            span,
            target,
            verdict: Some(verdict),
            strategy,
            elements: bound_elements,
        }
    }

    /// Bind elements in source order. Shared with object-creation
    /// initializers, which always use the `Construct` strategy.
    pub(crate) fn bind_elements(
        &mut self,
        elements: &[CollectionElement],
        strategy: &CollectionStrategy,
        adders: &[ResolvedMethod],
        collection_type: TypeId,
    ) -> Vec<BoundElement> {
        elements
            .iter()
            .enumerate()
            .map(|(order, &item)| {
                let order = u32::try_from(order).unwrap_or(u32::MAX);
                match item {
                    CollectionElement::Expr(e) => {
                        self.bind_plain_element(order, e, strategy, adders, collection_type)
                    }
                    CollectionElement::Spread(e) => {
                        self.bind_spread_element(order, e, strategy, adders, collection_type)
                    }
                }
            })
            .collect()
    }

    fn strategy_for(&self, target: TypeId, verdict: &ConstructibilityVerdict) -> CollectionStrategy {
        match verdict {
            ConstructibilityVerdict::Array { element, .. } => CollectionStrategy::Array {
                array_type: strip_nullable_ref(self.ctx.db, target),
                element: *element,
            },
            ConstructibilityVerdict::Span {
                span_type,
                element,
                readonly,
                constructor,
            } => CollectionStrategy::Span {
                span_type: *span_type,
                element: *element,
                readonly: *readonly,
                constructor: constructor.clone(),
            },
            ConstructibilityVerdict::InterfaceBackedByDefault {
                concrete,
                constructor,
                ..
            } => CollectionStrategy::Construct {
                collection_type: *concrete,
                constructor: Some(constructor.clone()),
                constructor_args: Vec::new(),
                add_range: self.list_add_range(*concrete),
            },
            ConstructibilityVerdict::UserDefinedCollection {
                concrete,
                constructor,
                ..
            } => CollectionStrategy::Construct {
                collection_type: *concrete,
                constructor: constructor.clone(),
                constructor_args: Vec::new(),
                add_range: self.list_add_range(*concrete),
            },
            ConstructibilityVerdict::CollectionBuilder {
                concrete,
                element,
                span_type,
                span_constructor,
                create,
                ..
            } => CollectionStrategy::Builder {
                collection_type: *concrete,
                element: *element,
                span_type: *span_type,
                span_constructor: span_constructor.clone(),
                create: create.clone(),
                builder_args: Vec::new(),
            },
            // Unreachable for a constructible verdict; an empty array keeps
            // the planner total.
            ConstructibilityVerdict::NotConstructible(_) => CollectionStrategy::Array {
                array_type: target,
                element: TypeId::ERROR,
            },
        }
    }

    /// `List<T>.AddRange`, resolved against the closed list type.
    fn list_add_range(&self, collection_type: TypeId) -> Option<ResolvedMethod> {
        let db = self.ctx.db;
        let Some((WellKnownType::ListT, _)) = db.well_known_of(collection_type) else {
            return None;
        };
        let id = lookup_member(db, WellKnownMember::ListAddRange)?;
        ResolvedMethod::new(db, id, collection_type, 0)
    }

    // -------------------------------------------------------------------------
    // Plain elements
    // -------------------------------------------------------------------------

    fn bind_plain_element(
        &mut self,
        order: u32,
        e: ExprId,
        strategy: &CollectionStrategy,
        adders: &[ResolvedMethod],
        collection_type: TypeId,
    ) -> BoundElement {
        let span = self.expr_span(e);
        let Some(element_type) = strategy.element_target() else {
            return self.bind_added_element(order, e, adders, collection_type);
        };
        let (value, conversion) = self.bind_value(e, element_type);
        let ok = conversion.is_implicit();
        if ok {
            self.check_element_nullability(e, element_type, span);
        }
        BoundElement {
            order,
            span,
            element_type: if ok { element_type } else { TypeId::ERROR },
            conversion,
            kind: BoundElementKind::Expr { value, adder: None },
        }
    }

    fn bind_added_element(
        &mut self,
        order: u32,
        e: ExprId,
        adders: &[ResolvedMethod],
        collection_type: TypeId,
    ) -> BoundElement {
        let span = self.expr_span(e);
        match self.resolve_adder(adders, AdderArgument::Expr(e)) {
            OverloadResult::Success(applicable) => {
                let param = applicable.param_types.first().copied().unwrap_or(TypeId::ERROR);
                self.check_member_feature(&applicable.method, span);
                let (value, conversion) = self.bind_value(e, param);
                let ok = conversion.is_implicit();
                if ok {
                    self.check_element_nullability(e, param, span);
                }
                trace!(element = order, adder = applicable.method.id.0, "bound element to adder");
                BoundElement {
                    order,
                    span,
                    element_type: if ok { param } else { TypeId::ERROR },
                    conversion,
                    kind: BoundElementKind::Expr {
                        value,
                        adder: Some(applicable.method),
                    },
                }
            }
            failure => {
                let source = self.argument_display(e);
                self.report_adder_failure(failure, collection_type, source, span);
                if !self.body.is_collection_literal(e) {
                    self.check_expr(e, None);
                }
                BoundElement {
                    order,
                    span,
                    element_type: TypeId::ERROR,
                    conversion: Conversion::NoConversion,
                    kind: BoundElementKind::Expr {
                        value: BoundValue::Expr(e),
                        adder: None,
                    },
                }
            }
        }
    }

    /// Bind one value converting to `target`. Nested literals and
    /// object-creation initializers bind into the same tree.
    pub(crate) fn bind_value(&mut self, e: ExprId, target: TypeId) -> (BoundValue, Conversion) {
        let body = self.body;
        let key = (body.id, e);
        match &body.expr(e).kind {
            ExprKind::CollectionLiteral { .. } => {
                let nested = self.bind_collection_literal(e, Some(target));
                let conversion = self
                    .ctx
                    .facts
                    .literal(key)
                    .map_or(Conversion::NoConversion, |facts| facts.conversion);
                self.ctx.facts.record_conversion(key, conversion);
                let value = match nested {
                    Some(nested) => BoundValue::Nested(Box::new(nested)),
                    None => BoundValue::Expr(e),
                };
                (value, conversion)
            }
            ExprKind::ObjectCreation { ty, .. } => {
                let nested = self.bind_object_creation(e);
                self.ctx.facts.record_natural_type(key, Some(*ty));
                let conversion = self.classify_conversion(e, Some(target));
                if !conversion.is_implicit() && !ty.is_error() {
                    self.ctx.error(
                        diagnostic_codes::CANNOT_IMPLICITLY_CONVERT_TYPE,
                        self.expr_span(e),
                        vec![(*ty).into(), target.into()],
                    );
                }
                self.ctx.facts.record_conversion(key, conversion);
                let value = match nested {
                    Some(nested) if nested.is_clean() => BoundValue::Nested(Box::new(nested)),
                    _ => BoundValue::Expr(e),
                };
                (value, conversion)
            }
            ExprKind::Constant(value) => {
                let conversion = self.convert_expr(e, target);
                (BoundValue::Constant(value.clone()), conversion)
            }
            _ => {
                let conversion = self.convert_expr(e, target);
                (BoundValue::Expr(e), conversion)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Spreads
    // -------------------------------------------------------------------------

    fn bind_spread_element(
        &mut self,
        order: u32,
        e: ExprId,
        strategy: &CollectionStrategy,
        adders: &[ResolvedMethod],
        collection_type: TypeId,
    ) -> BoundElement {
        let span = self.expr_span(e);
        let source_type = self.check_expr(e, None);
        let failed = |iteration_type: TypeId| BoundElement {
            order,
            span,
            element_type: TypeId::ERROR,
            conversion: Conversion::NoConversion,
            kind: BoundElementKind::Spread {
                source: e,
                source_type,
                iteration_type,
                spread: SpreadKind::GeneralEnumerable,
                enumerator: None,
                adder: None,
                bulk_compatible: false,
            },
        };
        if source_type.is_error() {
            return failed(TypeId::ERROR);
        }

        let located = self.ctx.locate(source_type, ProtocolKind::EnumeratorProducer);
        let Some(shape) = located.as_enumerator().cloned() else {
            self.ctx.error(
                diagnostic_codes::FOREACH_CANNOT_OPERATE_ON_TYPE,
                span,
                vec![source_type.into()],
            );
            return failed(TypeId::ERROR);
        };
        let iteration_type = shape.iteration_type;
        let spread = if self.is_countable(source_type) {
            SpreadKind::Countable
        } else {
            SpreadKind::GeneralEnumerable
        };

        if let Some(element_type) = strategy.element_target() {
            let conversion = self.ctx.classify_types(iteration_type, element_type);
            let ok = conversion.is_implicit();
            if !ok && !iteration_type.is_error() {
                self.ctx.error(
                    diagnostic_codes::CANNOT_IMPLICITLY_CONVERT_TYPE,
                    span,
                    vec![iteration_type.into(), element_type.into()],
                );
            }
            self.warn_lock_scope_conversion(conversion, iteration_type, span);
            return BoundElement {
                order,
                span,
                element_type: if ok { element_type } else { TypeId::ERROR },
                conversion,
                kind: BoundElementKind::Spread {
                    source: e,
                    source_type,
                    iteration_type,
                    spread,
                    enumerator: Some(shape),
                    adder: None,
                    bulk_compatible: false,
                },
            };
        }

        match self.resolve_adder(adders, AdderArgument::Typed(iteration_type)) {
            OverloadResult::Success(applicable) => {
                self.check_member_feature(&applicable.method, span);
                let param = applicable.param_types.first().copied().unwrap_or(TypeId::ERROR);
                let conversion = applicable
                    .conversions
                    .first()
                    .copied()
                    .unwrap_or(Conversion::NoConversion);
                self.warn_lock_scope_conversion(conversion, iteration_type, span);
                let bulk_compatible = match strategy {
                    CollectionStrategy::Construct {
                        collection_type,
                        add_range: Some(add_range),
                        ..
                    } => self.bridges_to_add_range(*collection_type, add_range, source_type, iteration_type),
                    _ => false,
                };
                BoundElement {
                    order,
                    span,
                    element_type: param,
                    conversion,
                    kind: BoundElementKind::Spread {
                        source: e,
                        source_type,
                        iteration_type,
                        spread,
                        enumerator: Some(shape),
                        adder: Some(applicable.method),
                        bulk_compatible,
                    },
                }
            }
            failure => {
                self.report_adder_failure(failure, collection_type, iteration_type.into(), span);
                failed(iteration_type)
            }
        }
    }

    /// Each item of a spread of lock objects loses the scope protocol when
    /// it is stored as another reference type.
    fn warn_lock_scope_conversion(&mut self, conversion: Conversion, iteration_type: TypeId, span: Span) {
        if conversion == Conversion::LockScopeToReference {
            self.ctx.warning(
                diagnostic_codes::CONVERTING_LOCK_TO_OTHER_TYPE,
                span,
                vec![iteration_type.into()],
            );
        }
    }

    /// A spread goes through `AddRange` unchanged when its iteration type is
    /// the list's element type and the source converts to the parameter.
    fn bridges_to_add_range(
        &self,
        collection_type: TypeId,
        add_range: &ResolvedMethod,
        source_type: TypeId,
        iteration_type: TypeId,
    ) -> bool {
        let Some((_, args)) = self.ctx.db.well_known_of(collection_type) else {
            return false;
        };
        if args.first().copied() != Some(iteration_type) {
            return false;
        }
        add_range
            .call_params()
            .first()
            .is_some_and(|param| self.ctx.classify_types(source_type, param.ty).is_implicit())
    }

    /// Arrays, strings, spans, and types with an accessible `int Length` or
    /// `int Count` instance property.
    fn is_countable(&self, ty: TypeId) -> bool {
        let db = self.ctx.db;
        let ty = strip_nullable_ref(db, ty);
        if ty == TypeId::STRING {
            return true;
        }
        match db.lookup(ty) {
            Some(TypeData::Array { .. }) => return true,
            Some(TypeData::Named { .. }) => {}
            _ => return false,
        }
        if matches!(
            db.well_known_of(ty),
            Some((WellKnownType::SpanT | WellKnownType::ReadOnlySpanT, _))
        ) {
            return true;
        }
        let table = member_table(db, self.ctx.caches, ty);
        ["Length", "Count"].into_iter().any(|name| {
            table.properties(db.atom(name)).iter().any(|entry| {
                let Some(info) = db.defs().property(entry.property) else {
                    return false;
                };
                !info.is_static
                    && info.has_getter
                    && entry.resolved_type(db) == Some(TypeId::INT)
                    && is_accessible(db, info.accessibility, info.declaring, &self.ctx.access)
            })
        })
    }

    // -------------------------------------------------------------------------
    // Adder resolution
    // -------------------------------------------------------------------------

    pub(crate) fn resolve_adder(
        &self,
        adders: &[ResolvedMethod],
        argument: AdderArgument,
    ) -> OverloadResult {
        if adders.is_empty() {
            return OverloadResult::Empty;
        }
        let ctx = &self.ctx;
        let body = self.body;
        ctx.with_classifier(|classifier| match argument {
            AdderArgument::Expr(e) => {
                let args = [e];
                ctx.resolver
                    .resolve(classifier, adders, &ExprArguments::new(ctx, body, &args))
            }
            AdderArgument::Typed(ty) => {
                let types = [ty];
                ctx.resolver
                    .resolve(classifier, adders, &TypedArguments::new(classifier, &types))
            }
        })
    }

    pub(crate) fn report_adder_failure(
        &mut self,
        failure: OverloadResult,
        collection_type: TypeId,
        source: DiagnosticArg,
        span: Span,
    ) {
        match failure {
            OverloadResult::Success(_) => {}
            OverloadResult::Ambiguous(first, second) => {
                self.ctx.error(
                    diagnostic_codes::AMBIGUOUS_CALL,
                    span,
                    vec![first.id.into(), second.id.into()],
                );
            }
            OverloadResult::NoApplicable {
                best: Some(best),
                failed_arg,
            } => {
                let index = failed_arg.unwrap_or(0);
                self.ctx.error(
                    diagnostic_codes::BAD_ARG_TYPES_FOR_COLLECTION_ADD,
                    span,
                    vec![best.id.into()],
                );
                if let Some(param) = best.call_params().get(index) {
                    self.ctx.error(
                        diagnostic_codes::ARGUMENT_CANNOT_CONVERT,
                        span,
                        vec![(index + 1).into(), source, param.ty.into()],
                    );
                }
            }
            OverloadResult::NoApplicable { best: None, .. } | OverloadResult::Empty => {
                self.ctx.error(
                    diagnostic_codes::NO_DEFINITION_FOR_MEMBER,
                    span,
                    vec![collection_type.into(), "Add".into()],
                );
            }
        }
    }

    /// How an argument appears in CS1503 when it has no type of its own.
    pub(crate) fn argument_display(&self, e: ExprId) -> DiagnosticArg {
        if let Some(ty) = self.natural_type(e) {
            return ty.into();
        }
        match &self.body.expr(e).kind {
            ExprKind::CollectionLiteral { .. } => "collection expression".into(),
            ExprKind::Lambda { .. } => "lambda expression".into(),
            _ => "<null>".into(),
        }
    }

    // -------------------------------------------------------------------------
    // Diagnostics helpers
    // -------------------------------------------------------------------------

    pub(crate) fn require_feature(&mut self, feature: Feature, span: Span) {
        if self.ctx.options.supports(feature) {
            return;
        }
        self.ctx.error(
            diagnostic_codes::FEATURE_NOT_AVAILABLE,
            span,
            vec![
                feature.display_name().into(),
                feature.display_name().into(),
                feature.required_version().display_name().into(),
            ],
        );
    }

    /// CS8652 for a library member gated behind a language version.
    pub(crate) fn check_member_feature(&mut self, method: &ResolvedMethod, span: Span) {
        let Some(feature) = method.required_feature else {
            return;
        };
        if self.ctx.options.supports(feature) {
            return;
        }
        self.ctx.error(
            diagnostic_codes::FEATURE_NOT_AVAILABLE,
            span,
            vec![
                method.id.into(),
                feature.display_name().into(),
                feature.required_version().display_name().into(),
            ],
        );
    }

    fn report_not_constructible(&mut self, target: TypeId, reason: NotConstructibleReason, span: Span) {
        match reason {
            NotConstructibleReason::MissingWellKnownMember(member) => self.ctx.error(
                diagnostic_codes::MISSING_PREDEFINED_MEMBER,
                span,
                vec![member.container_display().into(), member.member_name().into()],
            ),
            NotConstructibleReason::NoParameterlessConstructor => self.ctx.error(
                diagnostic_codes::NO_CONSTRUCTOR_TAKES_ARGUMENTS,
                span,
                vec![target.into(), 0usize.into()],
            ),
            NotConstructibleReason::NoBuilderElementType => self.ctx.error(
                diagnostic_codes::COLLECTION_BUILDER_NO_ELEMENT_TYPE,
                span,
                vec![target.into()],
            ),
            NotConstructibleReason::BuilderMethodNotFound(element) => {
                self.report_builder_method_not_found(target, element, span);
            }
            other => self.ctx.error(
                diagnostic_codes::COLLECTION_EXPRESSION_TARGET_NOT_CONSTRUCTIBLE,
                span,
                vec![target.into(), other.as_str().into()],
            ),
        }
    }

    /// CS9187, naming the method the `[CollectionBuilder]` attribute asks for.
    fn report_builder_method_not_found(&mut self, target: TypeId, element: TypeId, span: Span) {
        let db = self.ctx.db;
        let method: DiagnosticArg = match db
            .def_of(target)
            .and_then(|def| db.defs().get_collection_builder(def))
        {
            Some(attr) => attr.method.into(),
            None => "Create".into(),
        };
        self.ctx.error(
            diagnostic_codes::COLLECTION_BUILDER_METHOD_NOT_FOUND,
            span,
            vec![method, element.into(), target.into()],
        );
    }

    /// A `null` or maybe-null element stored into a non-nullable reference
    /// element type.
    fn check_element_nullability(&mut self, e: ExprId, element_type: TypeId, span: Span) {
        if !self.ctx.options.nullable_context {
            return;
        }
        let db = self.ctx.db;
        if !is_reference_type(db, element_type)
            || matches!(db.lookup(element_type), Some(TypeData::NullableRef(_)))
        {
            return;
        }
        let maybe_null = match &self.body.expr(e).kind {
            ExprKind::Constant(ConstantValue::Null) => true,
            _ => self
                .natural_type(e)
                .is_some_and(|ty| matches!(db.lookup(ty), Some(TypeData::NullableRef(_)))),
        };
        if !maybe_null {
            return;
        }
        self.ctx
            .warning(diagnostic_codes::POSSIBLE_NULL_REFERENCE_ASSIGNMENT, span, Vec::new());
        let fact = NullabilityFact {
            body: self.body.id,
            expr: e,
            span,
            target: element_type,
        };
        self.ctx.record_nullability(fact);
    }

    fn is_unconstrained_type_param(&self, ty: TypeId) -> bool {
        let db = self.ctx.db;
        match db.lookup(ty) {
            Some(TypeData::TypeParameter(param)) => db
                .defs()
                .type_param(param)
                .is_some_and(|info| info.constraints.is_unconstrained()),
            _ => false,
        }
    }

    /// Record facts for a literal that did not bind, after checking the
    /// elements that stand on their own.
    fn record_unbound_literal(
        &mut self,
        key: ExprKey,
        elements: &[CollectionElement],
        with_args: Option<&[ExprId]>,
        target: Option<TypeId>,
        verdict: Option<ConstructibilityVerdict>,
        conversion: Conversion,
    ) {
        let body = self.body;
        let standalone = elements
            .iter()
            .map(|item| item.expr())
            .chain(with_args.unwrap_or(&[]).iter().copied());
        for e in standalone {
            if !body.is_collection_literal(e) {
                self.check_expr(e, None);
            }
        }
        self.ctx.facts.record_literal(
            key,
            LiteralFacts {
                target,
                verdict,
                conversion,
                element_types: Vec::new(),
            },
        );
    }
}
