//! Common types and utilities for the csz semantic core.
//!
//! This crate provides foundational types used across all csz crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Source spans (`Span`)
//! - Diagnostic codes, categories and message templates
//! - Language versions and feature gates
//! - Analysis options (deserializable configuration)
//! - Analysis limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostic codes and templates (the core emits structured records only)
pub mod diagnostics;
pub use diagnostics::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes, format_message};

// Language versions and feature gates
pub mod language;
pub use language::{Feature, LanguageVersion};

// Configuration
pub mod options;
pub use options::AnalysisOptions;

// Centralized limits and thresholds
pub mod limits;
