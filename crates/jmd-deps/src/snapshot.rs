//! The project state exported by the host build tool: source sets, declared dependencies and
//! resolved configurations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jmd_core::{ConfigurationBucket, Coordinate, DeclarationContext, ModuleName};
use jmd_modules::naming::MAIN_SOURCE_SET;
use jmd_modules::ModuleDeclaration;
use jmd_versions::{ResolutionResults, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read project snapshot {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project snapshot {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub source_sets: Vec<SourceSetSnapshot>,
    /// Declared dependencies per bucket, as the host currently has them.
    #[serde(default)]
    pub declared: BTreeMap<ConfigurationBucket, Vec<Coordinate>>,
    /// Resolved configurations by name (`compileClasspath`, `runtimeClasspath`, ...).
    #[serde(default)]
    pub resolved: BTreeMap<String, Vec<ResolvedComponent>>,
    /// Directory relative source roots are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSetSnapshot {
    pub name: String,
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,
    /// Programmatic declaration used instead of a `module-info.java`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<ModuleDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DeclarationContext>,
}

impl SourceSetSnapshot {
    /// Explicit context, otherwise `test` for the `test` source set and `main` for all others.
    pub fn context(&self) -> DeclarationContext {
        self.context.unwrap_or(if self.name == "test" {
            DeclarationContext::Test
        } else {
            DeclarationContext::Main
        })
    }

    pub fn is_main(&self) -> bool {
        self.name == MAIN_SOURCE_SET
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedComponent {
    pub coordinate: Coordinate,
    pub version: String,
    /// Module name found in the resolved jar, if it is a module at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<ModuleName>,
    /// `true` for automatic modules (`Automatic-Module-Name` without `module-info.class`).
    #[serde(default)]
    pub automatic: bool,
}

impl ProjectSnapshot {
    pub fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut snapshot: ProjectSnapshot =
            serde_json::from_str(&text).map_err(|source| SnapshotError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        snapshot.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(snapshot)
    }

    pub fn source_set(&self, name: &str) -> Option<&SourceSetSnapshot> {
        self.source_sets.iter().find(|s| s.name == name)
    }

    /// Source roots of `source_set`, made absolute against [`Self::base_dir`].
    pub fn source_roots(&self, source_set: &SourceSetSnapshot) -> Vec<PathBuf> {
        source_set
            .source_roots
            .iter()
            .map(|root| {
                if root.is_absolute() {
                    root.clone()
                } else {
                    self.base_dir.join(root)
                }
            })
            .collect()
    }

    pub fn declared_in(&self, bucket: ConfigurationBucket) -> &[Coordinate] {
        self.declared.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resolved_configuration(&self, name: &str) -> Option<&[ResolvedComponent]> {
        self.resolved.get(name).map(Vec::as_slice)
    }

    /// Every resolved component of every configuration, deduplicated by GA and version.
    pub fn all_resolved(&self) -> Vec<&ResolvedComponent> {
        let mut seen = std::collections::BTreeSet::new();
        self.resolved
            .values()
            .flatten()
            .filter(|c| seen.insert((c.coordinate.ga_string(), c.version.clone())))
            .collect()
    }
}

impl ResolutionResults for ProjectSnapshot {
    fn resolved_version(&self, configuration: &str, ga: &Coordinate) -> Option<Version> {
        self.resolved_configuration(configuration)?
            .iter()
            .find(|c| c.coordinate.same_ga(ga))
            .and_then(|c| Version::parse(&c.version).ok())
    }
}
