//! Checker context and state.
//!
//! `CheckerContext` holds everything one body analysis reads or writes:
//! the shared type database and caches, the options, the overload-resolution
//! service, the access context, and the per-body outputs (diagnostics,
//! facts). `CheckerState` pairs a context with the body being checked; its
//! methods are spread over the modules of this crate.

use crate::ast::{Body, ExprId};
use crate::cancellation::CancellationToken;
use crate::facts::SemanticFacts;
use crate::nullability::{NullabilityFact, NullabilitySink};
use csz_common::options::AnalysisOptions;
use csz_common::span::Span;
use csz_solver::constructibility::{ConstructibilityClassifier, ConstructibilityVerdict};
use csz_solver::diagnostics::{DiagnosticArg, DiagnosticCollector, DiagnosticSink, PendingDiagnostic};
use csz_solver::recursion::{DepthCounter, RecursionProfile};
use csz_solver::shape_locator::{ProtocolKind, ShapeLocator, ShapeQueryResult};
use csz_solver::{AccessContext, Conversion, ConversionClassifier, OverloadResolver, SolverCaches};
use csz_solver::{TypeDatabase, TypeId};

pub struct CheckerContext<'a> {
    pub db: &'a dyn TypeDatabase,
    pub caches: &'a SolverCaches,
    pub options: &'a AnalysisOptions,
    pub resolver: &'a dyn OverloadResolver,
    pub access: AccessContext,
    pub diagnostics: DiagnosticCollector,
    pub facts: SemanticFacts,
    pub nullability: Option<&'a mut dyn NullabilitySink>,
    pub cancel: CancellationToken,
    /// Depth of enclosing expression-tree lambdas.
    pub(crate) expression_tree_depth: u32,
    /// Collection literals being bound.
    pub(crate) literal_depth: DepthCounter,
}

impl<'a> CheckerContext<'a> {
    pub fn new(
        db: &'a dyn TypeDatabase,
        caches: &'a SolverCaches,
        options: &'a AnalysisOptions,
        resolver: &'a dyn OverloadResolver,
        access: AccessContext,
    ) -> Self {
        Self {
            db,
            caches,
            options,
            resolver,
            access,
            diagnostics: DiagnosticCollector::new(),
            facts: SemanticFacts::new(),
            nullability: None,
            cancel: CancellationToken::new(),
            expression_tree_depth: 0,
            literal_depth: DepthCounter::with_profile(RecursionProfile::NestedLiteral),
        }
    }

    pub fn with_nullability(mut self, sink: &'a mut dyn NullabilitySink) -> Self {
        self.nullability = Some(sink);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn locator(&self) -> ShapeLocator<'a> {
        ShapeLocator::new(self.db, self.caches, self.access, self.options)
    }

    pub fn locate(&self, ty: TypeId, kind: ProtocolKind) -> ShapeQueryResult {
        self.locator().locate(ty, kind)
    }

    pub fn classify_target(&self, target: TypeId) -> ConstructibilityVerdict {
        let locator = self.locator();
        ConstructibilityClassifier::new(&locator).classify(target)
    }

    /// Run `f` with a conversion classifier whose scope-capability test is
    /// the structural lock protocol, judged from this context.
    pub fn with_classifier<R>(&self, f: impl FnOnce(&ConversionClassifier<'_>) -> R) -> R {
        let locator = self.locator();
        let check = |ty: TypeId| exposes_scope_protocol(&locator, ty);
        let classifier = ConversionClassifier::new(self.db).with_scope_check(&check);
        f(&classifier)
    }

    pub fn classify_types(&self, source: TypeId, target: TypeId) -> Conversion {
        self.with_classifier(|classifier| classifier.classify(source, target))
    }

    pub fn error(&mut self, code: u32, span: Span, args: Vec<DiagnosticArg>) {
        self.diagnostics.report(PendingDiagnostic::error(code, span, args));
    }

    pub fn warning(&mut self, code: u32, span: Span, args: Vec<DiagnosticArg>) {
        self.diagnostics.report(PendingDiagnostic::warning(code, span, args));
    }

    pub fn report(&mut self, diagnostic: PendingDiagnostic) {
        self.diagnostics.report(diagnostic);
    }

    pub(crate) fn record_nullability(&mut self, fact: NullabilityFact) {
        if let Some(sink) = self.nullability.as_deref_mut() {
            sink.record(fact);
        }
    }

    pub fn in_expression_tree(&self) -> bool {
        self.expression_tree_depth > 0
    }
}

/// A type exposes the scope protocol when it has a scope producer whose
/// result has a scope disposer.
pub fn exposes_scope_protocol(locator: &ShapeLocator<'_>, ty: TypeId) -> bool {
    match locator.locate(ty, ProtocolKind::ScopeProducer).as_method() {
        Some(producer) => locator
            .locate(producer.return_type, ProtocolKind::ScopeDisposer)
            .is_found(),
        None => false,
    }
}

/// Checker state for one body.
pub struct CheckerState<'a> {
    pub ctx: CheckerContext<'a>,
    pub body: &'a Body,
}

impl<'a> CheckerState<'a> {
    pub fn new(ctx: CheckerContext<'a>, body: &'a Body) -> Self {
        Self { ctx, body }
    }

    pub fn expr_span(&self, expr: ExprId) -> Span {
        self.body.expr(expr).span
    }

    pub fn into_context(self) -> CheckerContext<'a> {
        self.ctx
    }
}
