//! Engine version comparison and feature gating
//!
//! Every configuration feature introduced after the first `v2` release has a
//! minimum engine version. The engine version in effect is carried by an
//! [`Engine`] value passed explicitly to whatever needs to gate on it, so a
//! simulated version never leaks beyond the call that was given it.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Version string that supports every feature.
pub const DEVELOPMENT_VERSION: &str = "development";

/// A configuration feature that requires a minimum engine version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CommandAliases,
    OptionalImports,
    MultipleEnvFiles,
    SchemaValidation,
}

/// Minimum engine version for each feature.
pub const FEATURE_SUPPORT: [(Feature, &str); 4] = [
    (Feature::CommandAliases, "v2.1.0"),
    (Feature::OptionalImports, "v2.2.0"),
    (Feature::MultipleEnvFiles, "v2.5.0"),
    (Feature::SchemaValidation, "v2.6.0"),
];

impl Feature {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::CommandAliases => "command_aliases",
            Feature::OptionalImports => "optional_imports",
            Feature::MultipleEnvFiles => "multiple_env_files",
            Feature::SchemaValidation => "schema_validation",
        }
    }

    #[must_use]
    pub fn required_version(self) -> &'static str {
        FEATURE_SUPPORT
            .iter()
            .find(|(feature, _)| *feature == self)
            .map_or("v0.0.0", |(_, version)| version)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURE_SUPPORT
            .iter()
            .map(|(feature, _)| *feature)
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| format!("unknown feature '{s}'"))
    }
}

/// Splits `[v]MAJOR.MINOR.PATCH[-pre]` into numeric parts and an optional pre-release.
fn split_version(version: &str) -> ([u64; 3], Option<&str>) {
    let version = version.strip_prefix('v').unwrap_or(version);
    let (core, pre) = match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    };
    let mut parts = [0; 3];
    for (slot, part) in parts.iter_mut().zip(core.split('.')) {
        *slot = part.parse().unwrap_or(0);
    }
    (parts, pre)
}

/// Compares two version strings.
///
/// Missing or non-numeric components count as zero. A pre-release sorts before
/// the same release, and two pre-release suffixes compare as plain strings.
#[must_use]
pub fn compare_versions(v1: &str, v2: &str) -> Ordering {
    let (core1, pre1) = split_version(v1);
    let (core2, pre2) = split_version(v2);
    core1.cmp(&core2).then_with(|| match (pre1, pre2) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(b),
    })
}

/// True if `current` is a development build or at least the feature's minimum version.
#[must_use]
pub fn supports(current: &str, feature: Feature) -> bool {
    if current.is_empty() || current == DEVELOPMENT_VERSION {
        return true;
    }
    compare_versions(current, feature.required_version()) != Ordering::Less
}

/// The engine version that configuration is interpreted against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    version: String,
}

impl Engine {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Engine {
            version: version.into(),
        }
    }

    /// The version of this build.
    #[must_use]
    pub fn current() -> Self {
        Self::new(concat!("v", env!("CARGO_PKG_VERSION")))
    }

    /// The simulated version if one is given, otherwise the current one.
    #[must_use]
    pub fn simulated(version: Option<&str>) -> Self {
        match version.filter(|v| !v.is_empty()) {
            Some(v) => Self::new(v),
            None => Self::current(),
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn supports(&self, feature: Feature) -> bool {
        supports(&self.version, feature)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::current()
    }
}
