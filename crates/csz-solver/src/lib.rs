//! Type System and Shape Queries
//!
//! This crate answers the type-level questions behind collection literals and
//! `lock` statements without looking at syntax:
//!
//! - **Interned types**: `TypeId` handles over `TypeData`, O(1) equality
//! - **Definitions**: classes, structs, interfaces and their members
//! - **Shape Locator**: enumerator, `Add`, and lock-scope protocol lookup
//! - **Constructibility**: whether a target type can be built from a literal
//! - **Conversions**: standard and user-defined implicit conversion rules
//!
//! Every query is a pure function of its inputs and memoized in
//! `SolverCaches`, which all bodies of one compilation share.
pub mod caches;
pub mod class_hierarchy;
pub mod constructibility;
pub mod conversions;
pub mod corlib;
pub mod db;
pub mod def;
pub mod diagnostics;
pub mod format;
pub mod instantiate;
mod intern;
pub mod overload;
pub mod recursion;
pub mod shape_locator;
pub mod types;
pub mod user_defined;
pub mod well_known;

pub use caches::{CacheStats, SolverCaches};
pub use class_hierarchy::{AccessContext, ResolvedMethod, ResolvedParam};
pub use constructibility::{
    ConstructibilityClassifier, ConstructibilityVerdict, NotConstructibleReason,
};
pub use conversions::{Conversion, ConversionClassifier};
pub use corlib::{CoreLibrary, CoreLibraryBuilder, core_store};
pub use db::{MethodDecl, PropertyDecl, TypeDatabase, TypeDecl, TypeStore};
pub use def::{DefFlags, DefId, DefKind, WellKnownType};
pub use diagnostics::{DiagnosticArg, DiagnosticCollector, DiagnosticSink, PendingDiagnostic};
pub use format::TypeFormatter;
pub use intern::TypeInterner;
pub use overload::{BestMatchResolver, OverloadResolver, OverloadResult};
pub use shape_locator::{
    EnumeratorShape, EnumeratorSource, ProtocolKind, ShapeLocator, ShapeMatch, ShapeQueryResult,
};
pub use types::{IntrinsicKind, MethodId, TypeData, TypeId};
pub use well_known::WellKnownMember;
