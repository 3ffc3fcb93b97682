//! The few conditions that abort an analysis instead of producing diagnostics.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("analysis was cancelled")]
    Cancelled,
    /// A library type every classification depends on is not defined.
    #[error("fundamental type '{0}' is missing from the referenced libraries")]
    MissingFundamentalType(String),
}
