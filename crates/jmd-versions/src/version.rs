use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A dependency version such as `2.0.9`, `1.0-rc1` or `5.10.0.Final`.
///
/// Ordering compares the leading numeric segments first (missing segments count as `0`, so
/// `1.0 == 1.0.0` and `1.10 > 1.9`). With equal numbers a version without qualifier sorts above
/// one with a qualifier; two qualifiers compare lexicographically.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    numbers: Vec<u64>,
    qualifier: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid version `{0}`")]
pub struct InvalidVersion(String);

impl Version {
    pub fn parse(raw: &str) -> Result<Self, InvalidVersion> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(InvalidVersion(raw.to_string()));
        }

        let mut numbers = Vec::new();
        let mut rest = raw;
        loop {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                break;
            }
            let Ok(n) = rest[..digits].parse::<u64>() else {
                break;
            };
            numbers.push(n);
            let after = &rest[digits..];
            match after.strip_prefix('.') {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => {
                    rest = after;
                    break;
                }
            }
        }

        let qualifier = rest.trim_start_matches(['.', '-', '_', '+']);
        Ok(Self {
            raw: raw.to_string(),
            numbers,
            qualifier: (!qualifier.is_empty()).then(|| qualifier.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn numbers(&self) -> &[u64] {
        &self.numbers
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        for idx in 0..len {
            let a = self.numbers.get(idx).copied().unwrap_or(0);
            let b = other.numbers.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[test]
    fn numeric_segments_compare_as_numbers() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("2.0.10-alpha") > v("2.0.9"));
        assert!(v("1.78.1") > v("1.78"));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn qualifiers_sort_below_release() {
        assert!(v("1.0-rc1") < v("1.0"));
        assert!(v("5.10.0.Final") < v("5.10.0"));
        assert!(v("1.0-alpha") < v("1.0-beta"));
        assert!(v("1.2rc") < v("1.2"));
        assert!(v("1.2rc") > v("1.1"));
    }

    #[test]
    fn keeps_the_written_spelling() {
        let version = v("5.10.0.Final");
        assert_eq!(version.numbers(), &[5, 10, 0]);
        assert_eq!(version.qualifier(), Some("Final"));
        assert_eq!(version.to_string(), "5.10.0.Final");
    }

    #[test]
    fn rejects_blank_or_coordinate_like_input() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.0 beta").is_err());
        assert!(Version::parse("g:a").is_err());
    }
}
