use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

/// Everything noticed while loading a `jmd.toml` that did not stop it from loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Dotted paths of keys the schema ignores, e.g. `checks.strict_unsed`.
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
    /// Values the engine cannot work with. Callers should refuse to run.
    pub errors: Vec<ConfigValidationError>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty() && self.errors.is_empty()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Unknown keys and warnings rendered one per line, in that order.
    pub fn warning_messages(&self) -> Vec<String> {
        self.unknown_keys
            .iter()
            .map(|key| format!("unknown config key `{key}`"))
            .chain(self.warnings.iter().map(ToString::to_string))
            .collect()
    }

    pub(crate) fn merge(&mut self, validation: ValidationDiagnostics) {
        let ValidationDiagnostics { warnings, errors } = validation;
        self.warnings.extend(warnings);
        self.errors.extend(errors);
    }
}

/// Result of semantic validation alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationDiagnostics {
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<ConfigValidationError>,
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    LoggingLevelInvalid { value: String, normalized: String },
    /// A setting that has no effect with the rest of the configuration.
    Ineffective { toml_path: String, message: String },
    CatalogPathMissing { toml_path: String, resolved: PathBuf },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::LoggingLevelInvalid { value, normalized } => write!(
                f,
                "logging.level `{value}` is not a valid filter (normalized to `{normalized}`) and is ignored"
            ),
            ConfigWarning::Ineffective { toml_path, message } => {
                write!(f, "{toml_path}: {message}")
            }
            ConfigWarning::CatalogPathMissing { toml_path, resolved } => {
                write!(f, "{toml_path}: {} does not exist", resolved.display())
            }
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue { toml_path: String, message: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::InvalidValue { toml_path, message } => {
                write!(f, "{toml_path}: {message}")
            }
        }
    }
}

/// Deserialize `text`, collecting the paths of keys `T` does not consume (sorted, deduplicated).
pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut ignored = Vec::new();
    let value = serde_ignored::deserialize(toml::de::Deserializer::new(text), |path| {
        ignored.push(toml_path(&path));
    })?;
    ignored.sort();
    ignored.dedup();
    Ok((value, ignored))
}

/// `serde_ignored` renders `.a.b.0.?.c`; `jmd.toml` users read `a.b[0].c`.
fn toml_path(path: &serde_ignored::Path<'_>) -> String {
    let rendered = path.to_string();
    let mut parts: Vec<String> = Vec::new();
    for segment in rendered.split('.') {
        let segment = segment.trim_end_matches('?');
        if segment.is_empty() {
            continue;
        }
        match parts.last_mut() {
            Some(last) if segment.bytes().all(|b| b.is_ascii_digit()) => {
                last.push_str(&format!("[{segment}]"));
            }
            _ => parts.push(segment.to_string()),
        }
    }
    parts.join(".")
}
