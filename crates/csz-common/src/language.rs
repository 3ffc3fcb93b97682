//! Language versions and the feature gates that depend on them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language version selected for an analysis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageVersion {
    #[serde(rename = "10", alias = "CSharp10")]
    CSharp10,
    #[serde(rename = "11", alias = "CSharp11")]
    CSharp11,
    #[serde(rename = "12", alias = "CSharp12")]
    CSharp12,
    #[serde(rename = "13", alias = "CSharp13")]
    CSharp13,
    #[serde(rename = "preview", alias = "Preview")]
    Preview,
}

impl LanguageVersion {
    pub const LATEST: LanguageVersion = LanguageVersion::CSharp13;

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            LanguageVersion::CSharp10 => "10.0",
            LanguageVersion::CSharp11 => "11.0",
            LanguageVersion::CSharp12 => "12.0",
            LanguageVersion::CSharp13 => "13.0",
            LanguageVersion::Preview => "preview",
        }
    }

    /// Parse the spellings accepted on the command line (`12`, `12.0`, `preview`, `latest`).
    #[must_use]
    pub fn parse(text: &str) -> Option<LanguageVersion> {
        match text.trim().to_ascii_lowercase().as_str() {
            "10" | "10.0" => Some(LanguageVersion::CSharp10),
            "11" | "11.0" => Some(LanguageVersion::CSharp11),
            "12" | "12.0" => Some(LanguageVersion::CSharp12),
            "13" | "13.0" | "latest" => Some(LanguageVersion::CSharp13),
            "preview" => Some(LanguageVersion::Preview),
            _ => None,
        }
    }

    #[must_use]
    pub fn supports(self, feature: Feature) -> bool {
        self >= feature.required_version()
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        LanguageVersion::LATEST
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Language features that gate collection literals, lock objects and friends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    CollectionExpressions,
    LockObject,
    ParamsCollections,
    CollectionArguments,
}

impl Feature {
    #[must_use]
    pub const fn required_version(self) -> LanguageVersion {
        match self {
            Feature::CollectionExpressions => LanguageVersion::CSharp12,
            Feature::LockObject | Feature::ParamsCollections => LanguageVersion::CSharp13,
            Feature::CollectionArguments => LanguageVersion::Preview,
        }
    }

    /// Name used in the feature-not-available diagnostic.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Feature::CollectionExpressions => "collection expressions",
            Feature::LockObject => "Lock object",
            Feature::ParamsCollections => "params collections",
            Feature::CollectionArguments => "collection expression arguments",
        }
    }
}

#[cfg(test)]
#[path = "../tests/language_tests.rs"]
mod tests;
