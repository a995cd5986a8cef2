//! Module path analysis: how each resolved component relates to the mapping store.

use std::collections::BTreeSet;
use std::fmt;

use jmd_mapping::MappingStore;
use serde::Serialize;

use crate::snapshot::{ProjectSnapshot, ResolvedComponent};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModulePathAnalysis {
    /// Mapped components that are modules, `[AUTO] ` marks automatic modules.
    pub used: BTreeSet<String>,
    /// Unmapped components that are not modules either.
    pub non_modules: BTreeSet<String>,
    /// Modules without mapping, as `[mappings]` lines to copy into `jmd.toml`.
    pub missing: BTreeSet<String>,
    /// Mapped components that turn out not to be modules.
    pub wrong: BTreeSet<String>,
}

impl ModulePathAnalysis {
    pub fn has_warnings(&self) -> bool {
        !(self.non_modules.is_empty() && self.missing.is_empty() && self.wrong.is_empty())
    }
}

pub fn analyze_module_path(snapshot: &ProjectSnapshot, store: &MappingStore) -> ModulePathAnalysis {
    let mut analysis = ModulePathAnalysis::default();
    for component in snapshot.all_resolved() {
        classify(component, store, &mut analysis);
    }
    tracing::debug!(
        target: "jmd.deps",
        project = %snapshot.project,
        used = analysis.used.len(),
        non_modules = analysis.non_modules.len(),
        missing = analysis.missing.len(),
        wrong = analysis.wrong.len(),
        "analyzed module path"
    );
    analysis
}

fn classify(
    component: &ResolvedComponent,
    store: &MappingStore,
    analysis: &mut ModulePathAnalysis,
) {
    let ga = component.coordinate.ga_string();
    let label = if component.version.is_empty() {
        ga.clone()
    } else {
        format!("{ga} ({})", component.version)
    };
    let mapped = store.module_name_for(&component.coordinate);

    match (mapped, &component.module_name) {
        (Some(module), Some(_)) => {
            let marker = if component.automatic { "[AUTO] " } else { "" };
            analysis.used.insert(format!("{marker}{module} -> {label}"));
        }
        (None, None) => {
            analysis.non_modules.insert(label);
        }
        (None, Some(actual)) => {
            analysis.missing.insert(format!("\"{actual}\" = \"{ga}\""));
        }
        (Some(module), None) => {
            analysis.wrong.insert(format!("{module} -> {label}"));
        }
    }
}

impl fmt::Display for ModulePathAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "[INFO] All Java Modules required by this project", &self.used)?;
        if !self.non_modules.is_empty() {
            section(f, "[WARN] Components that are NOT Java Modules", &self.non_modules)?;
            writeln!(f, "Notes / Options:")?;
            writeln!(f, "  - This may be ok if the classpath is used in addition to the module path")?;
            writeln!(f, "  - Remove the dependencies or upgrade to higher versions")?;
            writeln!(f, "  - Patch legacy jars to modules")?;
        }
        if !self.wrong.is_empty() {
            section(f, "[WARN] Wrong Mappings: Components are not Modules", &self.wrong)?;
            writeln!(f, "Options to fix:")?;
            writeln!(f, "  - Upgrade to newer version(s)")?;
            writeln!(f, "  - Fix the mapping in the [mappings] table of jmd.toml")?;
        }
        if !self.missing.is_empty() {
            writeln!(f)?;
            writeln!(f, "[WARN] Missing Mappings")?;
            writeln!(f, "=======================")?;
            writeln!(f)?;
            writeln!(f, "[mappings]")?;
            for entry in &self.missing {
                writeln!(f, "{entry}")?;
            }
            writeln!(f)?;
            writeln!(f, "Options to fix:")?;
            writeln!(f, "  - Add the mappings above to jmd.toml")?;
        }
        Ok(())
    }
}

fn section(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    entries: &BTreeSet<String>,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(title.len()))?;
    for entry in entries {
        writeln!(f, "{entry}")?;
    }
    if !entries.is_empty() {
        writeln!(f)?;
    }
    Ok(())
}
