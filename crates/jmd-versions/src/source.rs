use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use jmd_core::Coordinate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Version;

/// Where a dependency version may come from, in decreasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSourceKind {
    /// The coordinate's own version, then the pin table.
    Literal,
    /// The version selected for the same GA in a reference configuration.
    ConsistentResolution,
    /// A constraint contributed by a platform (BOM).
    Platform,
    /// Explicitly no version source.
    None,
}

impl VersionSourceKind {
    pub fn name(self) -> &'static str {
        match self {
            VersionSourceKind::Literal => "literal",
            VersionSourceKind::ConsistentResolution => "consistent_resolution",
            VersionSourceKind::Platform => "platform",
            VersionSourceKind::None => "none",
        }
    }
}

impl fmt::Display for VersionSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VersionSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            VersionSourceKind::Literal,
            VersionSourceKind::ConsistentResolution,
            VersionSourceKind::Platform,
            VersionSourceKind::None,
        ]
        .into_iter()
        .find(|kind| kind.name() == s)
        .ok_or_else(|| format!("unknown version source `{s}`"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSource {
    pub kind: VersionSourceKind,
    /// Platform coordinate (`Platform`) or reference configuration name (`ConsistentResolution`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl VersionSource {
    pub fn literal() -> Self {
        Self {
            kind: VersionSourceKind::Literal,
            reference: None,
        }
    }

    pub fn consistent_resolution(configuration: impl Into<String>) -> Self {
        Self {
            kind: VersionSourceKind::ConsistentResolution,
            reference: Some(configuration.into()),
        }
    }

    pub fn platform(coordinate: &Coordinate) -> Self {
        Self {
            kind: VersionSourceKind::Platform,
            reference: Some(coordinate.ga_string()),
        }
    }

    pub fn none() -> Self {
        Self {
            kind: VersionSourceKind::None,
            reference: None,
        }
    }
}

/// Read access to the host's resolved configurations.
pub trait ResolutionResults {
    /// Version the host selected for `ga` in `configuration`, if that configuration was resolved
    /// and contains the component.
    fn resolved_version(&self, configuration: &str, ga: &Coordinate) -> Option<Version>;
}

/// No resolution results at all.
impl ResolutionResults for () {
    fn resolved_version(&self, _configuration: &str, _ga: &Coordinate) -> Option<Version> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionResolution {
    Resolved {
        version: Version,
        source: VersionSourceKind,
    },
    Unresolved,
}

impl VersionResolution {
    /// `coordinate` pinned to the resolved version, or its GA when unresolved.
    pub fn apply(&self, coordinate: &Coordinate) -> Coordinate {
        match self {
            VersionResolution::Resolved { version, .. } => {
                coordinate.ga().with_version(version.as_str())
            }
            VersionResolution::Unresolved => coordinate.ga(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, VersionResolution::Resolved { .. })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error(
        "ambiguous version for {coordinate}: {kind} sources disagree ({})",
        .candidates.join(", ")
    )]
    Ambiguous {
        coordinate: String,
        kind: VersionSourceKind,
        candidates: Vec<String>,
    },
    #[error("invalid version `{version}` for {coordinate}")]
    InvalidVersion { coordinate: String, version: String },
}

/// Resolves dependency versions from the configured sources.
///
/// Precedence is fixed (`Literal` > `ConsistentResolution` > `Platform`) regardless of the order
/// sources are listed in. Sources that are not listed are never consulted.
#[derive(Debug, Clone, Default)]
pub struct VersionSourceAdapter {
    sources: Vec<VersionSource>,
    pins: BTreeMap<String, Version>,
    /// platform reference -> GA -> version
    platform_constraints: BTreeMap<String, BTreeMap<String, Version>>,
    conflict_exceptions: BTreeSet<String>,
}

impl VersionSourceAdapter {
    pub fn new(sources: impl IntoIterator<Item = VersionSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pin(mut self, ga: &Coordinate, version: Version) -> Self {
        self.pins.insert(ga.ga_string(), version);
        self
    }

    #[must_use]
    pub fn with_platform_constraint(
        mut self,
        platform: &Coordinate,
        ga: &Coordinate,
        version: Version,
    ) -> Self {
        self.platform_constraints
            .entry(platform.ga_string())
            .or_default()
            .insert(ga.ga_string(), version);
        self
    }

    /// GA whose sibling-configuration disagreement is tolerated under consistent resolution.
    #[must_use]
    pub fn with_conflict_exception(mut self, ga: &Coordinate) -> Self {
        self.conflict_exceptions.insert(ga.ga_string());
        self
    }

    pub fn sources(&self) -> &[VersionSource] {
        &self.sources
    }

    /// GA coordinates of all listed platform sources.
    pub fn platform_coordinates(&self) -> Vec<Coordinate> {
        self.sources_of(VersionSourceKind::Platform)
            .filter_map(|s| s.reference.as_deref())
            .filter_map(|r| Coordinate::parse(r).ok())
            .collect()
    }

    pub fn is_conflict_excepted(&self, ga: &Coordinate) -> bool {
        self.has_source(VersionSourceKind::ConsistentResolution)
            && self.conflict_exceptions.contains(&ga.ga_string())
    }

    pub fn resolve_version(
        &self,
        coordinate: &Coordinate,
        results: &dyn ResolutionResults,
    ) -> Result<VersionResolution, VersionError> {
        if self.has_source(VersionSourceKind::Literal) {
            if let Some(raw) = coordinate.version() {
                let version = Version::parse(raw).map_err(|_| VersionError::InvalidVersion {
                    coordinate: coordinate.ga_string(),
                    version: raw.to_string(),
                })?;
                return Ok(resolved(version, VersionSourceKind::Literal));
            }
            if let Some(version) = self.pins.get(&coordinate.ga_string()) {
                return Ok(resolved(version.clone(), VersionSourceKind::Literal));
            }
        }

        let ga = coordinate.ga();
        let consistent = self
            .sources_of(VersionSourceKind::ConsistentResolution)
            .filter_map(|s| s.reference.as_deref())
            .filter_map(|configuration| results.resolved_version(configuration, &ga));
        let consistent = single(coordinate, VersionSourceKind::ConsistentResolution, consistent)?;
        if let Some(version) = consistent {
            return Ok(resolved(version, VersionSourceKind::ConsistentResolution));
        }

        let ga_string = ga.ga_string();
        let platform = self
            .sources_of(VersionSourceKind::Platform)
            .filter_map(|s| s.reference.as_deref())
            .filter_map(|platform| self.platform_constraints.get(platform)?.get(&ga_string))
            .cloned();
        if let Some(version) = single(coordinate, VersionSourceKind::Platform, platform)? {
            return Ok(resolved(version, VersionSourceKind::Platform));
        }

        tracing::trace!(
            target: "jmd.versions",
            coordinate = %ga_string,
            "no version source applies"
        );
        Ok(VersionResolution::Unresolved)
    }

    fn has_source(&self, kind: VersionSourceKind) -> bool {
        self.sources.iter().any(|s| s.kind == kind)
    }

    fn sources_of(&self, kind: VersionSourceKind) -> impl Iterator<Item = &VersionSource> {
        self.sources.iter().filter(move |s| s.kind == kind)
    }
}

fn resolved(version: Version, source: VersionSourceKind) -> VersionResolution {
    VersionResolution::Resolved { version, source }
}

/// The single version all candidates agree on; disagreement is an error.
fn single(
    coordinate: &Coordinate,
    kind: VersionSourceKind,
    candidates: impl Iterator<Item = Version>,
) -> Result<Option<Version>, VersionError> {
    let mut distinct: Vec<Version> = Vec::new();
    for candidate in candidates {
        if !distinct.contains(&candidate) {
            distinct.push(candidate);
        }
    }
    match distinct.len() {
        0 => Ok(None),
        1 => Ok(distinct.pop()),
        _ => Err(VersionError::Ambiguous {
            coordinate: coordinate.ga_string(),
            kind,
            candidates: distinct.iter().map(ToString::to_string).collect(),
        }),
    }
}
