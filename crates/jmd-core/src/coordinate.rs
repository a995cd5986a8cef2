use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A dependency coordinate: `group:artifact` (GA), optionally pinned to a version (GAV).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    group: String,
    artifact: String,
    version: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid coordinate `{input}`: {reason}")]
pub struct InvalidCoordinate {
    input: String,
    reason: &'static str,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Result<Self, InvalidCoordinate> {
        let group = group.into();
        let artifact = artifact.into();
        check_part(&group, "group", &group, &artifact)?;
        check_part(&artifact, "artifact", &group, &artifact)?;
        Ok(Self {
            group,
            artifact,
            version: None,
        })
    }

    /// Parse `group:artifact` or `group:artifact:version`.
    pub fn parse(input: &str) -> Result<Self, InvalidCoordinate> {
        let input = input.trim();
        let invalid = |reason| InvalidCoordinate {
            input: input.to_string(),
            reason,
        };

        let mut parts = input.split(':');
        let group = parts.next().unwrap_or_default();
        let Some(artifact) = parts.next() else {
            return Err(invalid("expected `group:artifact`"));
        };
        let version = parts.next();
        if parts.next().is_some() {
            return Err(invalid("too many `:` separated parts"));
        }

        let coordinate =
            Self::new(group, artifact).map_err(|_| invalid("empty group or artifact"))?;
        match version {
            None => Ok(coordinate),
            Some(v) if v.trim().is_empty() => Err(invalid("empty version")),
            Some(v) => Ok(coordinate.with_version(v.trim())),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The same coordinate without a version.
    #[must_use]
    pub fn ga(&self) -> Coordinate {
        Coordinate {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            version: None,
        }
    }

    pub fn is_gav(&self) -> bool {
        self.version.is_some()
    }

    /// Compare group and artifact only.
    pub fn same_ga(&self, other: &Coordinate) -> bool {
        self.group == other.group && self.artifact == other.artifact
    }

    /// `group:artifact` without the version.
    pub fn ga_string(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }
}

fn check_part(
    value: &str,
    what: &'static str,
    group: &str,
    artifact: &str,
) -> Result<(), InvalidCoordinate> {
    let input = format!("{group}:{artifact}");
    if value.trim().is_empty() {
        return Err(InvalidCoordinate {
            input,
            reason: if what == "group" {
                "group is empty"
            } else {
                "artifact is empty"
            },
        });
    }
    if value.contains(':') || value.chars().any(char::is_whitespace) {
        return Err(InvalidCoordinate {
            input,
            reason: "group and artifact must not contain `:` or whitespace",
        });
    }
    Ok(())
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

impl FromStr for Coordinate {
    type Err = InvalidCoordinate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Coordinate::parse(&raw).map_err(serde::de::Error::custom)
    }
}
