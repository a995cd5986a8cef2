//! Loading configuration and project snapshots, and running every unit through the pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use jmd_config::{ConfigDiagnostics, JmdConfig};
use jmd_core::Finding;
use jmd_deps::{
    DependencyDeclaration, Pipeline, ProjectSnapshot, RecordingHandler, Registrar, Synthesis,
    Synthesizer, Unit, UnitError, UnitReport,
};
use jmd_mapping::{Catalog, LocalModule, MappingStore};
use jmd_versions::VersionSourceAdapter;
use rayon::prelude::*;
use serde::Serialize;

/// Effective configuration for one invocation.
#[derive(Debug)]
pub struct Session {
    pub config: JmdConfig,
    pub config_path: Option<PathBuf>,
    pub diagnostics: ConfigDiagnostics,
    /// Relative config paths resolve against this directory.
    config_dir: PathBuf,
}

impl Session {
    /// Load `explicit`, or discover a config in `root`. Invalid values are an error, unknown keys
    /// and warnings are only reported.
    pub fn open(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let (config, config_path, diagnostics) = match explicit {
            Some(path) => {
                let (config, diagnostics) = JmdConfig::load_from_path_with_diagnostics(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                (config, Some(path.to_path_buf()), diagnostics)
            }
            None => jmd_config::load_for_workspace_with_diagnostics(root)?,
        };
        jmd_config::init_tracing(&config.logging);

        for message in diagnostics.warning_messages() {
            eprintln!("warning: {message}");
        }
        if let Some(first) = diagnostics.errors.first() {
            bail!(
                "invalid configuration ({} error(s)), first: {first}",
                diagnostics.errors.len()
            );
        }

        let config_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        tracing::debug!(
            target: "jmd.cli",
            config = ?config_path,
            "configuration loaded"
        );
        Ok(Self {
            config,
            config_path,
            diagnostics,
            config_dir,
        })
    }

    pub fn catalog(&self) -> Result<Option<Catalog>> {
        Ok(self.config.load_catalog(&self.config_dir)?)
    }

    /// Store over the configured catalog, `local_modules` and user mappings.
    pub fn store(&self, local_modules: &[LocalModule]) -> Result<MappingStore> {
        let catalog = self.catalog()?;
        Ok(self.config.mapping_store(catalog.as_ref(), local_modules)?)
    }

    pub fn versions(&self, store: &MappingStore) -> Result<VersionSourceAdapter> {
        Ok(self.config.version_adapter(store)?)
    }
}

/// A project snapshot with the units it contains.
#[derive(Debug)]
pub struct LoadedProject {
    pub snapshot: ProjectSnapshot,
    pub units: Vec<Unit>,
    /// Source sets that never become units: skipped (no module declaration) or failed to load.
    pub unprocessed: Vec<UnitReport>,
}

impl LoadedProject {
    /// Only a broken snapshot is an error. A source set whose declaration cannot be read is
    /// reported as failed and its siblings are still loaded.
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = ProjectSnapshot::from_path(path)?;
        let mut units = Vec::new();
        let mut unprocessed = Vec::new();
        for source_set in &snapshot.source_sets {
            match Unit::load(&snapshot, source_set) {
                Ok(Some(unit)) => units.push(unit),
                Ok(None) => unprocessed.push(UnitReport::skipped(format!(
                    "{}:{}",
                    snapshot.project, source_set.name
                ))),
                Err(UnitError::Read { unit, source }) => {
                    tracing::warn!(
                        target: "jmd.cli",
                        unit = %unit,
                        error = %source,
                        "cannot load unit"
                    );
                    unprocessed.push(UnitReport::failed(unit, source.to_string()));
                }
            }
        }
        Ok(Self {
            snapshot,
            units,
            unprocessed,
        })
    }

    pub fn local_modules(&self) -> Vec<LocalModule> {
        self.units
            .iter()
            .map(|unit| unit.local_module(&self.snapshot.group))
            .collect()
    }
}

pub fn load_projects(paths: &[PathBuf]) -> Result<Vec<LoadedProject>> {
    paths.iter().map(|path| LoadedProject::load(path)).collect()
}

#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    /// Conflicting entries inside one mapping source, reported once for the whole run.
    pub mapping_conflicts: Vec<Finding>,
    pub reports: Vec<UnitReport>,
    /// Declarations handed to each project's dependency graph, in registration order.
    pub registered: BTreeMap<String, Vec<DependencyDeclaration>>,
}

impl CheckOutcome {
    pub fn is_fatal(&self) -> bool {
        !self.mapping_conflicts.is_empty() || self.reports.iter().any(UnitReport::is_fatal)
    }

    /// Fatal findings, plus one per unit that failed to load.
    pub fn fatal_count(&self) -> usize {
        self.mapping_conflicts.len()
            + self
                .reports
                .iter()
                .map(|r| r.fatal_count() + usize::from(r.error.is_some()))
                .sum::<usize>()
    }

    pub fn advisory_count(&self) -> usize {
        self.reports.iter().map(UnitReport::advisory_count).sum()
    }
}

/// Synthesize and validate every unit of every project.
///
/// The store covers all projects' own modules so sibling projects map to each other. Units run in
/// parallel and each one ends up in its own report; registration happens afterwards in unit order.
pub fn check(session: &Session, projects: &[LoadedProject]) -> Result<CheckOutcome> {
    let local_modules: Vec<LocalModule> = projects
        .iter()
        .flat_map(LoadedProject::local_modules)
        .collect();
    let store = session.store(&local_modules)?;
    let versions = session.versions(&store)?;
    let validation = session.config.validation_options();
    let pipeline = Pipeline::new(
        &store,
        &versions,
        session.config.synthesis_options(),
        &validation,
    );

    let work: Vec<(&ProjectSnapshot, &Unit)> = projects
        .iter()
        .flat_map(|project| project.units.iter().map(move |unit| (&project.snapshot, unit)))
        .collect();
    tracing::info!(
        target: "jmd.cli",
        units = work.len(),
        mappings = store.len(),
        "processing units"
    );
    let processed: Vec<UnitReport> = work
        .par_iter()
        .map(|(snapshot, unit)| pipeline.process(unit, snapshot))
        .collect();

    let mut registered = BTreeMap::new();
    let mut processed = processed.into_iter();
    let mut reports = Vec::new();
    for project in projects {
        let mut registrar = Registrar::new(RecordingHandler::default());
        for report in processed.by_ref().take(project.units.len()) {
            registrar.register(&report.declarations);
            reports.push(report);
        }
        reports.extend(project.unprocessed.iter().cloned());
        registered.insert(
            project.snapshot.project.clone(),
            registrar.into_handler().added,
        );
    }

    Ok(CheckOutcome {
        mapping_conflicts: store.conflict_findings(),
        reports,
        registered,
    })
}

/// Synthesis of every unit of `project` against `store`, in unit order. Validation is left out;
/// generators use this, `check` reports on it.
pub fn synthesize_project<'p>(
    session: &Session,
    store: &MappingStore,
    project: &'p LoadedProject,
) -> Result<Vec<(&'p Unit, Synthesis)>> {
    let versions = session.versions(store)?;
    let synthesizer = Synthesizer::new(store, &versions, session.config.synthesis_options());
    Ok(project
        .units
        .iter()
        .map(|unit| {
            let synthesis =
                synthesizer.synthesize(&unit.declaration, unit.context, &project.snapshot);
            (unit, synthesis)
        })
        .collect())
}
