//! Many bodies, one type store.
//!
//! A `Compilation` owns the solver caches and the options shared by every
//! body it analyses. Each body gets its own `CheckerState`; bodies fan out
//! over rayon while the type store and the caches are shared read-mostly.

use crate::ast::{Body, BodyId};
use crate::cancellation::CancellationToken;
use crate::context::{CheckerContext, CheckerState};
use crate::error::AnalysisError;
use crate::facts::SemanticFacts;
use crate::nullability::NullabilityFact;
use csz_common::diagnostics::diagnostic_codes;
use csz_common::language::Feature;
use csz_common::options::AnalysisOptions;
use csz_common::span::Span;
use csz_solver::constructibility::ConstructibilityClassifier;
use csz_solver::types::TypeData;
use csz_solver::{
    AccessContext, BestMatchResolver, DefId, OverloadResolver, PendingDiagnostic, ShapeLocator,
    SolverCaches, TypeDatabase, TypeId, WellKnownType,
};
use rayon::prelude::*;
use tracing::{debug, info_span};

/// Everything one body analysis produced.
#[derive(Debug)]
pub struct BodyAnalysis {
    pub body: BodyId,
    pub diagnostics: Vec<PendingDiagnostic>,
    pub facts: SemanticFacts,
    pub nullability: Vec<NullabilityFact>,
}

impl BodyAnalysis {
    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(PendingDiagnostic::is_error)
    }
}

pub struct Compilation<'a> {
    db: &'a dyn TypeDatabase,
    options: AnalysisOptions,
    caches: SolverCaches,
    resolver: Box<dyn OverloadResolver>,
    cancel: CancellationToken,
}

impl<'a> Compilation<'a> {
    pub fn new(db: &'a dyn TypeDatabase, options: AnalysisOptions) -> Self {
        Self {
            db,
            options,
            caches: SolverCaches::new(),
            resolver: Box::new(BestMatchResolver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn OverloadResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn db(&self) -> &'a dyn TypeDatabase {
        self.db
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn caches(&self) -> &SolverCaches {
        &self.caches
    }

    fn access_context(&self, within: Option<DefId>) -> AccessContext {
        AccessContext::new(within, self.db.atom(&self.options.assembly_name))
    }

    /// Without the `IEnumerable` marker no literal can be classified.
    fn ensure_fundamentals(&self) -> Result<(), AnalysisError> {
        match self.db.well_known_type(WellKnownType::IEnumerable, &[]) {
            Some(_) => Ok(()),
            None => Err(AnalysisError::MissingFundamentalType(
                WellKnownType::IEnumerable.full_name(),
            )),
        }
    }

    pub fn analyze_body(&self, body: &Body) -> Result<BodyAnalysis, AnalysisError> {
        self.ensure_fundamentals()?;
        let _span = info_span!("analyze_body", body = body.id.0).entered();

        let mut nullability: Vec<NullabilityFact> = Vec::new();
        let (diagnostics, facts) = {
            let ctx = CheckerContext::new(
                self.db,
                &self.caches,
                &self.options,
                self.resolver.as_ref(),
                self.access_context(body.within),
            )
            .with_nullability(&mut nullability)
            .with_cancellation(self.cancel.clone());
            let mut state = CheckerState::new(ctx, body);
            let outcome = state.check_body();
            let mut ctx = state.into_context();
            outcome?;
            (ctx.diagnostics.take_diagnostics(), ctx.facts)
        };

        debug!(
            body = body.id.0,
            diagnostics = diagnostics.len(),
            literals = facts.literal_count(),
            plans = facts.plan_count(),
            "analysed body"
        );
        Ok(BodyAnalysis {
            body: body.id,
            diagnostics,
            facts,
            nullability,
        })
    }

    /// Analyse bodies in parallel. Results keep the input order; the first
    /// error (cancellation) wins.
    pub fn analyze_bodies(&self, bodies: &[Body]) -> Result<Vec<BodyAnalysis>, AnalysisError> {
        self.ensure_fundamentals()?;
        let results: Vec<Result<BodyAnalysis, AnalysisError>> =
            bodies.par_iter().map(|body| self.analyze_body(body)).collect();
        let stats = self.caches.stats();
        debug!(bodies = bodies.len(), ?stats, "analysed bodies");
        results.into_iter().collect()
    }

    /// Check the type of a `params` parameter declaration. Arrays are always
    /// fine; any other type needs params collections and must be a
    /// constructible collection.
    pub fn check_params_declaration(
        &self,
        param_type: TypeId,
        within: Option<DefId>,
        span: Span,
    ) -> Vec<PendingDiagnostic> {
        if let Some(TypeData::Array { rank: 1, .. }) = self.db.lookup(param_type) {
            return Vec::new();
        }
        let mut diagnostics = Vec::new();
        let feature = Feature::ParamsCollections;
        if !self.options.supports(feature) {
            diagnostics.push(PendingDiagnostic::error(
                diagnostic_codes::FEATURE_NOT_AVAILABLE,
                span,
                vec![
                    feature.display_name().into(),
                    feature.display_name().into(),
                    feature.required_version().display_name().into(),
                ],
            ));
        }
        let locator = ShapeLocator::new(
            self.db,
            &self.caches,
            self.access_context(within),
            &self.options,
        );
        if let Err(reason) =
            ConstructibilityClassifier::new(&locator).validate_params_collection(param_type)
        {
            debug!(param_type = param_type.0, reason = reason.as_str(), "invalid params type");
            diagnostics.push(PendingDiagnostic::error(
                diagnostic_codes::PARAMS_MUST_BE_COLLECTION,
                span,
                Vec::new(),
            ));
        }
        diagnostics
    }
}
