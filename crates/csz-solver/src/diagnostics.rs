//! Structured diagnostics.
//!
//! ## Lazy Diagnostics
//!
//! Analysis records a `PendingDiagnostic` holding raw data (`TypeId`s,
//! `MethodId`s, numbers); text is produced only when a diagnostic is rendered
//! for a human. Overload resolution tries and discards many candidates, so
//! formatting eagerly would mostly be wasted work.

use crate::format::TypeFormatter;
use crate::types::{MethodId, TypeId};
use csz_common::diagnostics::{
    DiagnosticCategory, code_label, format_message, get_diagnostic_category, get_message_template,
};
use csz_common::interner::Atom;
use csz_common::span::Span;
use serde::Serialize;
use std::sync::Arc;

// =============================================================================
// Lazy Diagnostic Arguments
// =============================================================================

/// Argument for a diagnostic message template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticArg {
    /// Formatted via `TypeFormatter`.
    Type(TypeId),
    /// Formatted as `Container.Name(params)`.
    Method(MethodId),
    Atom(Atom),
    String(Arc<str>),
    Number(usize),
}

macro_rules! impl_from_diagnostic_arg {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(impl From<$source> for DiagnosticArg {
            fn from(v: $source) -> Self { Self::$variant(v) }
        })*
    };
}

impl_from_diagnostic_arg! {
    TypeId   => Type,
    MethodId => Method,
    Atom     => Atom,
    usize    => Number,
}

impl From<&str> for DiagnosticArg {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for DiagnosticArg {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl DiagnosticArg {
    pub fn render(&self, formatter: &TypeFormatter<'_>, resolve: impl Fn(Atom) -> Arc<str>) -> String {
        match self {
            DiagnosticArg::Type(ty) => formatter.format(*ty),
            DiagnosticArg::Method(method) => formatter.format_method_id(*method),
            DiagnosticArg::Atom(atom) => resolve(*atom).to_string(),
            DiagnosticArg::String(text) => text.to_string(),
            DiagnosticArg::Number(n) => n.to_string(),
        }
    }
}

/// A diagnostic that hasn't been rendered yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingDiagnostic {
    /// Numeric code (`29` renders as `CS0029`).
    pub code: u32,
    pub category: DiagnosticCategory,
    pub span: Span,
    pub args: Vec<DiagnosticArg>,
    /// Related information (additional locations).
    pub related: Vec<PendingDiagnostic>,
}

impl PendingDiagnostic {
    /// A diagnostic with the category registered for `code`.
    pub fn new(code: u32, span: Span, args: Vec<DiagnosticArg>) -> Self {
        Self {
            code,
            category: get_diagnostic_category(code).unwrap_or(DiagnosticCategory::Error),
            span,
            args,
            related: Vec::new(),
        }
    }

    pub fn error(code: u32, span: Span, args: Vec<DiagnosticArg>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            ..Self::new(code, span, args)
        }
    }

    pub fn warning(code: u32, span: Span, args: Vec<DiagnosticArg>) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            ..Self::new(code, span, args)
        }
    }

    pub fn with_related(mut self, related: PendingDiagnostic) -> Self {
        self.related.push(related);
        self
    }

    pub fn is_error(&self) -> bool {
        self.category.is_error()
    }

    pub fn label(&self) -> String {
        code_label(self.code)
    }

    /// Fill the message template for this code.
    pub fn render_message(&self, formatter: &TypeFormatter<'_>, resolve: impl Fn(Atom) -> Arc<str>) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.render(formatter, &resolve))
            .collect();
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        match get_message_template(self.code) {
            Some(template) => format_message(template, &refs),
            None => refs.join(", "),
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receives diagnostics as analysis produces them.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: PendingDiagnostic);
}

impl DiagnosticSink for Vec<PendingDiagnostic> {
    fn report(&mut self, diagnostic: PendingDiagnostic) {
        self.push(diagnostic);
    }
}

/// Collects diagnostics in report order.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<PendingDiagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[PendingDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<PendingDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(PendingDiagnostic::is_error)
    }

    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: PendingDiagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
