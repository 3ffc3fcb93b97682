//! Shared fixtures for the checker integration tests.

#![allow(dead_code)]

use csz_checker::{Body, BodyAnalysis, Compilation, ExprId, PlanPrinter, StmtId};
use csz_common::options::AnalysisOptions;
use csz_solver::db::{MethodDecl, TypeDecl};
use csz_solver::{DefId, TypeDatabase, TypeId, TypeStore, WellKnownType};

pub use csz_solver::core_store;

/// Route `tracing` output through the test harness. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CSZ_LOG"))
        .with_test_writer()
        .try_init();
}

pub fn analyze(store: &TypeStore, body: &Body) -> BodyAnalysis {
    analyze_with(store, AnalysisOptions::default(), body)
}

pub fn analyze_with(store: &TypeStore, options: AnalysisOptions, body: &Body) -> BodyAnalysis {
    init_tracing();
    Compilation::new(store, options)
        .analyze_body(body)
        .expect("analysis completes")
}

pub fn well_known(store: &TypeStore, tag: WellKnownType, args: &[TypeId]) -> TypeId {
    store.well_known_type(tag, args).expect("well-known type installed")
}

pub fn list_of(store: &TypeStore, element: TypeId) -> TypeId {
    well_known(store, WellKnownType::ListT, &[element])
}

/// `class name : IEnumerable<int>` with an `Add(int)`, declared in the
/// analysed assembly.
pub fn int_collection(store: &TypeStore, name: &str) -> (DefId, TypeId) {
    let def = store.declare(TypeDecl::class("App", name).assembly("Main"));
    store.add_interface(def, well_known(store, WellKnownType::IEnumerableT, &[TypeId::INT]));
    store.add_method(def, MethodDecl::new("Add").param("item", TypeId::INT));
    (def, store.named(def, &[]))
}

/// A class with no members at all.
pub fn plain_class(store: &TypeStore, name: &str) -> TypeId {
    let def = store.declare(TypeDecl::class("App", name).assembly("Main"));
    store.named(def, &[])
}

/// The stored plan of a literal or object creation, printed with the body's
/// expression names.
pub fn printed_plan(store: &TypeStore, analysis: &BodyAnalysis, body: &Body, expr: ExprId) -> String {
    let plan = analysis
        .facts
        .peek_plan((body.id, expr))
        .expect("plan stored for expression");
    PlanPrinter::new(store).with_body(body).print(plan)
}

pub fn printed_lock_plan(
    store: &TypeStore,
    analysis: &BodyAnalysis,
    body: &Body,
    stmt: StmtId,
) -> String {
    let plan = analysis
        .facts
        .peek_lock_plan((body.id, stmt))
        .expect("plan stored for lock");
    PlanPrinter::new(store).with_body(body).print(plan)
}
