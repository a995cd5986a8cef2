use std::fmt;

use jmd_core::Finding;
use serde::{Deserialize, Serialize};

use crate::host::DependencyDeclaration;

/// Aggregated result of processing one unit (a project source set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub declarations: Vec<DependencyDeclaration>,
    /// Why the unit could not be processed at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitReport {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    /// A unit without module declaration. It has nothing to derive or check.
    pub fn skipped(unit: impl Into<String>) -> Self {
        Self {
            skipped: true,
            ..Self::new(unit)
        }
    }

    /// A unit whose declaration could not be loaded.
    pub fn failed(unit: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(unit)
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.error.is_some() || self.findings.iter().any(Finding::is_fatal)
    }

    pub fn fatal_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_fatal()).count()
    }

    pub fn advisory_count(&self) -> usize {
        self.findings.len() - self.fatal_count()
    }
}

impl fmt::Display for UnitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unit)?;
        if let Some(module) = &self.module {
            write!(f, " (module {module})")?;
        }
        if self.skipped {
            return writeln!(f, ": skipped, no module declaration");
        }
        if let Some(error) = &self.error {
            return writeln!(f, ": failed, {error}");
        }
        writeln!(
            f,
            ": {} declaration(s), {} fatal, {} advisory",
            self.declarations.len(),
            self.fatal_count(),
            self.advisory_count()
        )?;
        for finding in &self.findings {
            let mut lines = finding.to_string();
            while lines.ends_with('\n') {
                lines.pop();
            }
            for (idx, line) in lines.lines().enumerate() {
                let indent = if idx == 0 { "  " } else { "    " };
                writeln!(f, "{indent}{line}")?;
            }
            writeln!(f, "    hint: {}", finding.remediation())?;
        }
        Ok(())
    }
}
