use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Coordinate, ModuleName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FindingKind {
    MissingMapping,
    UnusedDeclared,
    DuplicateMapping,
    VersionConflict,
    MissingModuleInfo,
    InvalidDirective,
    DirectiveOrder,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FindingKind::MissingMapping => "MissingMapping",
            FindingKind::UnusedDeclared => "UnusedDeclared",
            FindingKind::DuplicateMapping => "DuplicateMapping",
            FindingKind::VersionConflict => "VersionConflict",
            FindingKind::MissingModuleInfo => "MissingModuleInfo",
            FindingKind::InvalidDirective => "InvalidDirective",
            FindingKind::DirectiveOrder => "DirectiveOrder",
        };
        f.write_str(name)
    }
}

/// Whether a finding aborts the owning build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Advisory,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Advisory => "advisory",
            Severity::Fatal => "fatal",
        })
    }
}

/// A single diagnostic produced while synthesizing or validating a unit.
///
/// Findings are immutable once produced; the host decides how to surface them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    pub detail: String,
}

impl Finding {
    pub fn new(kind: FindingKind, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            module: None,
            coordinate: None,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: ModuleName) -> Self {
        self.module = Some(module);
        self
    }

    #[must_use]
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    pub fn missing_mapping(module: ModuleName) -> Self {
        Finding::new(
            FindingKind::MissingMapping,
            Severity::Fatal,
            format!("no coordinate is known for module `{module}`"),
        )
        .with_module(module)
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// A short instruction telling the user how to resolve the finding.
    pub fn remediation(&self) -> String {
        let module = self
            .module
            .as_ref()
            .map(ModuleName::as_str)
            .unwrap_or("<module>");
        let coordinate = self
            .coordinate
            .as_ref()
            .map(Coordinate::ga_string)
            .unwrap_or_else(|| "<group:artifact>".to_string());
        match self.kind {
            FindingKind::MissingMapping => format!(
                "add an explicit mapping for module {module}: [mappings] \"{module}\" = \"group:artifact\""
            ),
            FindingKind::UnusedDeclared => format!(
                "remove the dependency on {coordinate}, add `requires {module};`, or declare it as runtimeOnly"
            ),
            FindingKind::DuplicateMapping => format!(
                "keep a single coordinate for module {module} in this mapping source"
            ),
            FindingKind::VersionConflict => format!(
                "align the versions of {coordinate} (platform or consistent resolution), or list it under [versions.consistent_resolution] excepted"
            ),
            FindingKind::MissingModuleInfo => {
                "add a module-info.java or a programmatic declaration".to_string()
            }
            FindingKind::InvalidDirective => "fix the syntax of the module directive".to_string(),
            FindingKind::DirectiveOrder => {
                "reorder the directives as listed in the finding".to_string()
            }
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.kind)?;
        match (&self.module, &self.coordinate) {
            (Some(module), Some(coordinate)) => write!(f, " {module} ({coordinate})")?,
            (Some(module), None) => write!(f, " {module}")?,
            (None, Some(coordinate)) => write!(f, " {coordinate}")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mapping_is_fatal_and_names_the_module() {
        let module = ModuleName::parse("org.junit.jupiter.api").unwrap();
        let finding = Finding::missing_mapping(module.clone());
        assert!(finding.is_fatal());
        assert_eq!(finding.module.as_ref(), Some(&module));
        assert_eq!(
            finding.to_string(),
            "[fatal] MissingMapping org.junit.jupiter.api: no coordinate is known for module `org.junit.jupiter.api`"
        );
        assert!(finding
            .remediation()
            .contains("add an explicit mapping for module org.junit.jupiter.api"));
    }
}
