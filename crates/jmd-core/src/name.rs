use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A JPMS module name such as `org.slf4j` or `com.fasterxml.jackson.databind`.
///
/// Every dot-separated segment must be a Java identifier. Lookups keyed by module names are
/// exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid module name `{name}`: {reason}")]
pub struct InvalidModuleName {
    name: String,
    reason: &'static str,
}

impl InvalidModuleName {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ModuleName {
    pub fn parse(name: impl Into<String>) -> Result<Self, InvalidModuleName> {
        let name = name.into();
        if let Err(reason) = validate(&name) {
            return Err(InvalidModuleName { name, reason });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the dot-separated segments of this name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns `true` if `other` is this module or lives "below" it in the naming hierarchy
    /// (`org.slf4j` is a prefix of `org.slf4j.spi.SLF4JServiceProvider`).
    pub fn is_prefix_of(&self, other: &str) -> bool {
        other == self.0
            || other
                .strip_prefix(self.0.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

fn validate(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    for segment in name.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return Err("empty segment");
        };
        if !is_java_ident_start(first) {
            return Err("segment does not start with a Java identifier character");
        }
        if !chars.all(is_java_ident_part) {
            return Err("segment contains a character that is not allowed in Java identifiers");
        }
    }
    Ok(())
}

fn is_java_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_java_ident_part(c: char) -> bool {
    is_java_ident_start(c) || c.is_numeric()
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ModuleName {
    type Err = InvalidModuleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ModuleName {
    type Error = InvalidModuleName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ModuleName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ModuleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ModuleName::parse(raw).map_err(serde::de::Error::custom)
    }
}
