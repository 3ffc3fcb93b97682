//! Checker for collection literals, collection initializers and `lock`
//! statements.
//!
//! This crate walks method bodies and drives the solver's type-level queries:
//! - `ast` - bodies as arenas of already-resolved expressions and statements
//! - `context` - `CheckerContext` / `CheckerState` shared by every module
//! - `expr`, `statements` - expression typing and statement checking
//! - `conversion_classifier` - expression-level conversion classification
//! - `collection_literal` - the element/spread binder
//! - `collection_arguments` - constructor selection for `with(...)` arguments
//! - `collection_initializer` - `new C { ... }` through the same adder machinery
//! - `lock_statement` - structural scope protocol vs. monitor fallback
//! - `lowering` - the lowering planner and plan printer
//! - `facts` - per-node semantic facts consumed by tooling and the emitter
//! - `compilation` - parallel analysis of many bodies
//!
//! Diagnostics are structured `PendingDiagnostic`s; no text is produced here.

pub mod ast;
pub mod cancellation;
pub mod collection_arguments;
pub mod collection_initializer;
pub mod collection_literal;
pub mod compilation;
pub mod context;
pub mod conversion_classifier;
pub mod error;
pub mod expr;
pub mod facts;
pub mod lock_statement;
pub mod lowering;
pub mod nullability;
pub mod statements;

pub use ast::{
    Body, BodyBuilder, BodyId, CollectionElement, ExprId, ExprKind, StmtId, StmtKind, Suspension,
};
pub use cancellation::CancellationToken;
pub use collection_literal::{
    BoundCollection, BoundElement, BoundElementKind, BoundValue, CollectionStrategy, SpreadKind,
};
pub use compilation::{BodyAnalysis, Compilation};
pub use context::{CheckerContext, CheckerState};
pub use error::AnalysisError;
pub use facts::{LiteralFacts, LockFacts, LockPlanKind, SemanticFacts};
pub use lock_statement::{BoundLock, LockStrategy};
pub use lowering::printer::PlanPrinter;
pub use lowering::{Effect, LoweringPlan, LoweringPlanner, LoweringStep};
pub use nullability::{NullabilityFact, NullabilitySink};
