//! Analysis options shared by every crate in the workspace.

use crate::language::{Feature, LanguageVersion};
use serde::{Deserialize, Serialize};

/// Options for one analysis run.
///
/// Deserialized from the `options` object of a fixture file; every field has a
/// default so an empty object is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub language_version: LanguageVersion,
    /// Preprocessor symbols that keep `[Conditional]` members alive.
    pub defined_symbols: Vec<String>,
    /// Enables nullable reference advisories.
    pub nullable_context: bool,
    /// Assembly the analysed code belongs to; drives `internal` accessibility.
    pub assembly_name: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            language_version: LanguageVersion::default(),
            defined_symbols: Vec::new(),
            nullable_context: false,
            assembly_name: "Main".to_string(),
        }
    }
}

impl AnalysisOptions {
    #[must_use]
    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    #[must_use]
    pub fn is_symbol_defined(&self, symbol: &str) -> bool {
        self.defined_symbols.iter().any(|s| s == symbol)
    }

    #[must_use]
    pub fn supports(&self, feature: Feature) -> bool {
        self.language_version.supports(feature)
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
