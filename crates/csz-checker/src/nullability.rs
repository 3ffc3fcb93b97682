//! Side channel for nullability advisories.
//!
//! Flow analysis lives elsewhere; the binder only reports where a possibly
//! null element flows into a non-nullable reference element type.

use crate::ast::{BodyId, ExprId};
use csz_common::span::Span;
use csz_solver::TypeId;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NullabilityFact {
    pub body: BodyId,
    pub expr: ExprId,
    pub span: Span,
    /// Element type the value is stored as.
    pub target: TypeId,
}

pub trait NullabilitySink: Send {
    fn record(&mut self, fact: NullabilityFact);
}

impl NullabilitySink for Vec<NullabilityFact> {
    fn record(&mut self, fact: NullabilityFact) {
        self.push(fact);
    }
}

/// Discards every fact.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreNullability;

impl NullabilitySink for IgnoreNullability {
    fn record(&mut self, _fact: NullabilityFact) {}
}
