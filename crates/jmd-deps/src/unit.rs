//! One unit of work: a source set with its module declaration, taken through synthesis and
//! validation.

use std::path::PathBuf;

use jmd_core::{DeclarationContext, Finding, FindingKind, Severity};
use jmd_mapping::{LocalModule, MappingStore};
use jmd_modules::{naming, ModuleDeclaration, ModuleInfoReader, ReadError};
use jmd_versions::VersionSourceAdapter;
use thiserror::Error;

use crate::report::UnitReport;
use crate::snapshot::{ProjectSnapshot, SourceSetSnapshot};
use crate::synthesize::{SynthesisOptions, Synthesizer};
use crate::validate::{ValidationOptions, Validator};

#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit {unit}: {source}")]
    Read {
        unit: String,
        #[source]
        source: ReadError,
    },
}


/// A source set that has a module declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub project: String,
    pub source_set: String,
    pub context: DeclarationContext,
    pub declaration: ModuleDeclaration,
    /// `None` for programmatic declarations.
    pub module_info: Option<PathBuf>,
    /// Recoverable problems found while parsing the declaration.
    pub parse_findings: Vec<Finding>,
}

impl Unit {
    /// Load the declaration of `source_set`. `Ok(None)` when there is none, the unit is skipped.
    pub fn load(
        snapshot: &ProjectSnapshot,
        source_set: &SourceSetSnapshot,
    ) -> Result<Option<Unit>, UnitError> {
        let unit = |declaration: ModuleDeclaration,
                    module_info: Option<PathBuf>,
                    parse_findings: Vec<Finding>| Unit {
            project: snapshot.project.clone(),
            source_set: source_set.name.clone(),
            context: source_set.context(),
            declaration,
            module_info,
            parse_findings,
        };

        if let Some(declaration) = &source_set.declaration {
            return Ok(Some(unit(declaration.clone(), None, Vec::new())));
        }

        let id = format!("{}:{}", snapshot.project, source_set.name);
        let reader = ModuleInfoReader::new(snapshot.source_roots(source_set));
        let (path, parsed) = match reader.read() {
            Ok(read) => read,
            Err(err) if err.is_missing_module_info() => {
                tracing::debug!(
                    target: "jmd.deps",
                    unit = %id,
                    "no module declaration, skipping unit"
                );
                return Ok(None);
            }
            Err(source) => return Err(UnitError::Read { unit: id, source }),
        };

        let module = &parsed.declaration.name;
        let parse_findings = parsed
            .errors
            .iter()
            .map(|err| {
                Finding::new(
                    FindingKind::InvalidDirective,
                    Severity::Advisory,
                    format!("{}: {err}", path.display()),
                )
                .with_module(module.clone())
            })
            .collect();
        Ok(Some(unit(parsed.declaration, Some(path), parse_findings)))
    }

    /// `project:sourceSet`
    pub fn id(&self) -> String {
        format!("{}:{}", self.project, self.source_set)
    }

    /// The module this unit builds, for self-mapping.
    pub fn local_module(&self, group: &str) -> LocalModule {
        LocalModule {
            module: self.declaration.name.clone(),
            group: group.to_string(),
            project: self.project.clone(),
            source_set: self.source_set.clone(),
        }
    }

    /// Prefix of the build's own module names, derived from this unit's module name.
    pub fn own_prefix(&self) -> Option<String> {
        naming::own_module_prefix(self.declaration.name.as_str(), &self.project, &self.source_set)
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| format!("{prefix}."))
    }
}

/// Everything a unit needs besides its own declaration. Shared read-only across units.
pub struct Pipeline<'a> {
    store: &'a MappingStore,
    versions: &'a VersionSourceAdapter,
    synthesis: SynthesisOptions,
    validation: &'a ValidationOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a MappingStore,
        versions: &'a VersionSourceAdapter,
        synthesis: SynthesisOptions,
        validation: &'a ValidationOptions,
    ) -> Self {
        Self {
            store,
            versions,
            synthesis,
            validation,
        }
    }

    /// Synthesize and validate one unit. Every problem ends up as a finding in the report.
    pub fn process(&self, unit: &Unit, snapshot: &ProjectSnapshot) -> UnitReport {
        let _span = tracing::debug_span!(target: "jmd.deps", "unit", unit = %unit.id()).entered();

        let synthesis = Synthesizer::new(self.store, self.versions, self.synthesis).synthesize(
            &unit.declaration,
            unit.context,
            snapshot,
        );

        let mut validation = self.validation.clone();
        if validation.own_prefix.is_none() {
            validation.own_prefix = unit.own_prefix();
        }
        let mut findings = unit.parse_findings.clone();
        findings.extend(
            Validator::new(self.store, self.versions, &validation).validate(
                &unit.declaration,
                &synthesis,
                snapshot,
                unit.context,
            ),
        );

        let report = UnitReport {
            unit: unit.id(),
            module: Some(unit.declaration.name.to_string()),
            skipped: false,
            findings,
            declarations: synthesis.declarations,
            error: None,
        };
        if report.is_fatal() {
            tracing::warn!(
                target: "jmd.deps",
                unit = %report.unit,
                fatal = report.fatal_count(),
                "unit has fatal findings"
            );
        }
        report
    }
}
