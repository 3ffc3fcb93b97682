//! Lowering/Emission Planner
//!
//! Turns a bound collection literal (or `lock` statement) into a
//! `LoweringPlan`: a small tree describing the runtime shape the emitter
//! produces, with every library member it calls already resolved.
//!
//! # Plans
//!
//! - `ArrayInit`: arrays. All-constant blittable primitives pack into a
//!   little-endian metadata blob; everything else stores element by element.
//!   The length is fixed, computed from countable spreads, or gathered through
//!   a temporary when a spread is not countable.
//! - `SpanWrap`: spans wrap an array plan with `ctor(T[])`, except an
//!   all-constant primitive `ReadOnlySpan<T>`, which reads the blob directly.
//! - `ConstructThenAdd`: every other collection is constructed once and then
//!   receives one adder call per element, in order. Spreads expand per element
//!   or go through `List<T>.AddRange` when the iteration type matches.
//! - `BuilderCall`: `[CollectionBuilder]` types gather the elements into a
//!   `ReadOnlySpan<T>` (planned like a span literal) and call the builder's
//!   `Create` once, after any `with(...)` arguments.
//! - `ScopeEnterDispose` / `MonitorFallback`: the two `lock` lowerings.
//!
//! Plans are stored in `SemanticFacts` and taken once by the emitter. The
//! [`printer`] renders them as canonical text.

pub mod printer;

use crate::ast::ExprId;
use crate::collection_literal::{
    BoundCollection, BoundElement, BoundElementKind, BoundValue, CollectionStrategy, SpreadKind,
};
use crate::lock_statement::{BoundLock, LockStrategy};
use csz_common::limits::{ELEMENT_INLINE_CAPACITY, MAX_METADATA_BLOB_BYTES};
use csz_solver::types::{ConstantValue, TypeData};
use csz_solver::{Conversion, MethodId, ResolvedMethod, TypeDatabase, TypeId};
use smallvec::SmallVec;
use tracing::debug;

pub type Steps = SmallVec<[LoweringStep; ELEMENT_INLINE_CAPACITY]>;

// =============================================================================
// Plan IR
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum LoweringPlan {
    ArrayInit {
        array_type: TypeId,
        element_type: TypeId,
        length: ArrayLength,
        initializer: ArrayInitializer,
    },
    ConstructThenAdd {
        collection_type: TypeId,
        /// `None` for an implicit parameterless constructor.
        constructor: Option<ResolvedMethod>,
        constructor_args: Vec<ExprId>,
        steps: Steps,
    },
    SpanWrap {
        span_type: TypeId,
        readonly: bool,
        /// `ctor(T[])`; `None` for the direct blob form.
        constructor: Option<ResolvedMethod>,
        backing: SpanBacking,
    },
    BuilderCall {
        collection_type: TypeId,
        /// `None` only for a literal that failed to bind; such plans are
        /// never stored.
        create: Option<ResolvedMethod>,
        builder_args: Vec<ExprId>,
        /// The `SpanWrap` passed as the last argument.
        span: Box<LoweringPlan>,
    },
    MonitorFallback {
        /// Evaluated once and held in a temporary for `Exit`.
        resource: ExprId,
        resource_type: TypeId,
        /// `Monitor.Enter(object, ref bool)`
        enter: MethodId,
        /// `Monitor.Exit(object)`, in `finally`
        exit: MethodId,
    },
    ScopeEnterDispose {
        resource: ExprId,
        producer: ResolvedMethod,
        disposer: ResolvedMethod,
        scope_local: ScopeLocal,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayLength {
    Fixed(usize),
    /// Plain element count plus the runtime length of each countable spread.
    Computed {
        fixed: usize,
        spreads: Vec<ExprId>,
    },
    /// A spread is not countable: elements go to a temporary first.
    Gathered,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArrayInitializer {
    /// `Array.Empty<T>()`
    Empty,
    MetadataBlob {
        bytes: Vec<u8>,
    },
    ElementStores(Steps),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpanBacking {
    Array(Box<LoweringPlan>),
    MetadataBlob { element_type: TypeId, bytes: Vec<u8> },
}

/// The synthesized local holding a lock scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeLocal {
    pub ty: TypeId,
    /// The lock body contains `await` or `yield`; a by-ref-like local cannot
    /// be hoisted across it.
    pub crosses_suspension: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoweringStep {
    /// Array element store. `index` is `None` once a spread has made the
    /// position dynamic.
    Store {
        index: Option<usize>,
        value: LoweredValue,
        conversion: Conversion,
    },
    Add {
        adder: ResolvedMethod,
        value: LoweredValue,
        conversion: Conversion,
    },
    /// Indexed loop over a countable source.
    SpreadCountable {
        source: ExprId,
        adder: Option<ResolvedMethod>,
    },
    /// Enumerator loop, disposed in `finally` when `dispose` is set.
    SpreadEnumerate {
        source: ExprId,
        adder: Option<ResolvedMethod>,
        dispose: bool,
    },
    AddRange {
        method: ResolvedMethod,
        source: ExprId,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoweredValue {
    Constant(ConstantValue),
    Expr(ExprId),
    Nested(Box<LoweringPlan>),
}

impl LoweringPlan {
    pub const fn kind_str(&self) -> &'static str {
        match self {
            LoweringPlan::ArrayInit { .. } => "array_init",
            LoweringPlan::ConstructThenAdd { .. } => "construct_then_add",
            LoweringPlan::SpanWrap { .. } => "span_wrap",
            LoweringPlan::BuilderCall { .. } => "builder_call",
            LoweringPlan::MonitorFallback { .. } => "monitor_fallback",
            LoweringPlan::ScopeEnterDispose { .. } => "scope_enter_dispose",
        }
    }

    /// Runtime effects in execution order.
    pub fn effects(&self) -> Vec<Effect> {
        let mut out = Vec::new();
        self.collect_effects(&mut out);
        out
    }

    fn collect_effects(&self, out: &mut Vec<Effect>) {
        match self {
            LoweringPlan::ArrayInit {
                array_type,
                initializer,
                ..
            } => {
                out.push(Effect::Construct(*array_type));
                if let ArrayInitializer::ElementStores(steps) = initializer {
                    for step in steps {
                        step.collect_effects(out);
                    }
                }
            }
            LoweringPlan::ConstructThenAdd {
                collection_type,
                constructor,
                constructor_args,
                steps,
            } => {
                out.extend(constructor_args.iter().map(|&arg| Effect::Evaluate(arg)));
                if let Some(constructor) = constructor {
                    out.push(Effect::Call(constructor.id));
                }
                out.push(Effect::Construct(*collection_type));
                for step in steps {
                    step.collect_effects(out);
                }
            }
            LoweringPlan::SpanWrap {
                span_type,
                constructor,
                backing,
                ..
            } => {
                if let SpanBacking::Array(plan) = backing {
                    plan.collect_effects(out);
                }
                if let Some(constructor) = constructor {
                    out.push(Effect::Call(constructor.id));
                }
                out.push(Effect::Construct(*span_type));
            }
            LoweringPlan::BuilderCall {
                create,
                builder_args,
                span,
                ..
            } => {
                out.extend(builder_args.iter().map(|&arg| Effect::Evaluate(arg)));
                span.collect_effects(out);
                if let Some(create) = create {
                    out.push(Effect::Call(create.id));
                }
            }
            LoweringPlan::MonitorFallback {
                resource,
                enter,
                exit,
                ..
            } => {
                out.push(Effect::Evaluate(*resource));
                out.push(Effect::Call(*enter));
                out.push(Effect::Call(*exit));
            }
            LoweringPlan::ScopeEnterDispose {
                resource,
                producer,
                disposer,
                ..
            } => {
                out.push(Effect::Evaluate(*resource));
                out.push(Effect::Call(producer.id));
                out.push(Effect::Call(disposer.id));
            }
        }
    }
}

impl LoweringStep {
    fn collect_effects(&self, out: &mut Vec<Effect>) {
        match self {
            LoweringStep::Store { value, .. } => {
                value.collect_effects(out);
                out.push(Effect::Store);
            }
            LoweringStep::Add { adder, value, .. } => {
                value.collect_effects(out);
                out.push(Effect::Call(adder.id));
            }
            LoweringStep::SpreadCountable { source, adder }
            | LoweringStep::SpreadEnumerate { source, adder, .. } => {
                out.push(Effect::Enumerate(*source));
                match adder {
                    Some(adder) => out.push(Effect::Call(adder.id)),
                    None => out.push(Effect::Store),
                }
            }
            LoweringStep::AddRange { method, source } => {
                out.push(Effect::Evaluate(*source));
                out.push(Effect::Call(method.id));
            }
        }
    }
}

impl LoweredValue {
    fn collect_effects(&self, out: &mut Vec<Effect>) {
        match self {
            LoweredValue::Constant(_) => {}
            LoweredValue::Expr(e) => out.push(Effect::Evaluate(*e)),
            LoweredValue::Nested(plan) => plan.collect_effects(out),
        }
    }
}

/// One runtime action of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    Construct(TypeId),
    Evaluate(ExprId),
    /// A spread source is evaluated and walked.
    Enumerate(ExprId),
    Call(MethodId),
    Store,
}

impl Effect {
    /// The source expression this effect evaluates, if any.
    pub const fn source_expr(self) -> Option<ExprId> {
        match self {
            Effect::Evaluate(e) | Effect::Enumerate(e) => Some(e),
            _ => None,
        }
    }
}

// =============================================================================
// Planner
// =============================================================================

pub struct LoweringPlanner<'a> {
    db: &'a dyn TypeDatabase,
}

impl<'a> LoweringPlanner<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self { db }
    }

    pub fn plan(&self, bound: &BoundCollection) -> LoweringPlan {
        let plan = match &bound.strategy {
            CollectionStrategy::Array {
                array_type,
                element,
            } => self.plan_array(*array_type, *element, &bound.elements),
            CollectionStrategy::Span {
                span_type,
                element,
                readonly,
                constructor,
            } => self.plan_span(*span_type, *element, *readonly, constructor, &bound.elements),
            CollectionStrategy::Construct {
                collection_type,
                constructor,
                constructor_args,
                add_range,
            } => LoweringPlan::ConstructThenAdd {
                collection_type: *collection_type,
                constructor: constructor.clone(),
                constructor_args: constructor_args.clone(),
                steps: bound
                    .elements
                    .iter()
                    .map(|element| self.add_step(element, add_range.as_ref()))
                    .collect(),
            },
            CollectionStrategy::Builder {
                collection_type,
                element,
                span_type,
                span_constructor,
                create,
                builder_args,
            } => LoweringPlan::BuilderCall {
                collection_type: *collection_type,
                create: create.clone(),
                builder_args: builder_args.clone(),
                span: Box::new(self.plan_span(
                    *span_type,
                    *element,
                    true,
                    span_constructor,
                    &bound.elements,
                )),
            },
        };
        debug!(
            node = bound.node.0,
            target = bound.target.0,
            plan = plan.kind_str(),
            "planned collection literal"
        );
        plan
    }

    pub fn plan_lock(&self, bound: &BoundLock) -> LoweringPlan {
        match &bound.strategy {
            LockStrategy::Scope { producer, disposer } => LoweringPlan::ScopeEnterDispose {
                resource: bound.resource,
                producer: producer.clone(),
                disposer: disposer.clone(),
                scope_local: ScopeLocal {
                    ty: producer.return_type,
                    crosses_suspension: bound.crosses_suspension,
                },
            },
            LockStrategy::Monitor { enter, exit } => LoweringPlan::MonitorFallback {
                resource: bound.resource,
                resource_type: bound.resource_type,
                enter: *enter,
                exit: *exit,
            },
        }
    }

    fn plan_array(&self, array_type: TypeId, element: TypeId, elements: &[BoundElement]) -> LoweringPlan {
        if elements.is_empty() {
            return LoweringPlan::ArrayInit {
                array_type,
                element_type: element,
                length: ArrayLength::Fixed(0),
                initializer: ArrayInitializer::Empty,
            };
        }
        if let Some(bytes) = self.metadata_blob(element, elements) {
            return LoweringPlan::ArrayInit {
                array_type,
                element_type: element,
                length: ArrayLength::Fixed(elements.len()),
                initializer: ArrayInitializer::MetadataBlob { bytes },
            };
        }

        let mut fixed = 0;
        let mut spreads = Vec::new();
        let mut gathered = false;
        let mut steps = Steps::new();
        for element in elements {
            match &element.kind {
                BoundElementKind::Expr { value, .. } => {
                    let index = spreads.is_empty().then_some(fixed);
                    fixed += 1;
                    steps.push(LoweringStep::Store {
                        index: if gathered { None } else { index },
                        value: self.lower_value(value),
                        conversion: lowered_conversion(value, element.conversion),
                    });
                }
                BoundElementKind::Spread {
                    source,
                    spread,
                    enumerator,
                    ..
                } => {
                    match spread {
                        SpreadKind::Countable => {
                            spreads.push(*source);
                            steps.push(LoweringStep::SpreadCountable {
                                source: *source,
                                adder: None,
                            });
                        }
                        SpreadKind::GeneralEnumerable => {
                            gathered = true;
                            steps.push(LoweringStep::SpreadEnumerate {
                                source: *source,
                                adder: None,
                                dispose: enumerator.as_ref().is_some_and(|e| e.needs_disposal),
                            });
                        }
                    }
                }
            }
        }
        let length = if gathered {
            ArrayLength::Gathered
        } else if spreads.is_empty() {
            ArrayLength::Fixed(fixed)
        } else {
            ArrayLength::Computed { fixed, spreads }
        };
        LoweringPlan::ArrayInit {
            array_type,
            element_type: element,
            length,
            initializer: ArrayInitializer::ElementStores(steps),
        }
    }

    fn plan_span(
        &self,
        span_type: TypeId,
        element: TypeId,
        readonly: bool,
        constructor: &ResolvedMethod,
        elements: &[BoundElement],
    ) -> LoweringPlan {
        if readonly {
            if let Some(bytes) = self.metadata_blob(element, elements) {
                return LoweringPlan::SpanWrap {
                    span_type,
                    readonly,
                    constructor: None,
                    backing: SpanBacking::MetadataBlob {
                        element_type: element,
                        bytes,
                    },
                };
            }
        }
        let array_type = self.db.array(element, 1);
        let backing = self.plan_array(array_type, element, elements);
        LoweringPlan::SpanWrap {
            span_type,
            readonly,
            constructor: Some(constructor.clone()),
            backing: SpanBacking::Array(Box::new(backing)),
        }
    }

    fn add_step(&self, element: &BoundElement, add_range: Option<&ResolvedMethod>) -> LoweringStep {
        match &element.kind {
            BoundElementKind::Expr { value, adder } => {
                let lowered = self.lower_value(value);
                let conversion = lowered_conversion(value, element.conversion);
                match adder {
                    Some(adder) => LoweringStep::Add {
                        adder: adder.clone(),
                        value: lowered,
                        conversion,
                    },
                    None => LoweringStep::Store {
                        index: None,
                        value: lowered,
                        conversion,
                    },
                }
            }
            BoundElementKind::Spread {
                source,
                spread,
                enumerator,
                adder,
                bulk_compatible,
                ..
            } => match (add_range, *bulk_compatible) {
                (Some(method), true) => LoweringStep::AddRange {
                    method: method.clone(),
                    source: *source,
                },
                _ => match spread {
                    SpreadKind::Countable => LoweringStep::SpreadCountable {
                        source: *source,
                        adder: adder.clone(),
                    },
                    SpreadKind::GeneralEnumerable => LoweringStep::SpreadEnumerate {
                        source: *source,
                        adder: adder.clone(),
                        dispose: enumerator.as_ref().is_some_and(|e| e.needs_disposal),
                    },
                },
            },
        }
    }

    fn lower_value(&self, value: &BoundValue) -> LoweredValue {
        match value {
            BoundValue::Constant(constant) => LoweredValue::Constant(constant.clone()),
            BoundValue::Expr(e) => LoweredValue::Expr(*e),
            BoundValue::Nested(nested) => LoweredValue::Nested(Box::new(self.plan(nested))),
        }
    }

    /// Little-endian bytes for a non-empty, spread-free, all-constant literal
    /// of a blittable primitive element type.
    fn metadata_blob(&self, element: TypeId, elements: &[BoundElement]) -> Option<Vec<u8>> {
        let Some(TypeData::Intrinsic(kind)) = self.db.lookup(element) else {
            return None;
        };
        let size = kind.blittable_size()?;
        if elements.is_empty() || elements.len().saturating_mul(size) > MAX_METADATA_BLOB_BYTES {
            return None;
        }
        let mut bytes = Vec::with_capacity(elements.len() * size);
        for element in elements {
            let BoundElementKind::Expr {
                value: BoundValue::Constant(constant),
                ..
            } = &element.kind
            else {
                return None;
            };
            if !constant.write_le(kind, &mut bytes) {
                return None;
            }
        }
        Some(bytes)
    }
}

/// Nested plans produce their target type directly.
fn lowered_conversion(value: &BoundValue, conversion: Conversion) -> Conversion {
    match value {
        BoundValue::Nested(_) => Conversion::Identity,
        _ => conversion,
    }
}

#[cfg(test)]
#[path = "../../tests/lowering_tests.rs"]
mod tests;
