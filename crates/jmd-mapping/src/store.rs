use std::collections::BTreeMap;
use std::fmt;

use jmd_core::{Coordinate, Finding, FindingKind, InvalidCoordinate, ModuleName, Severity};
use jmd_modules::naming;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Origin of a mapping entry. Variants are ordered by increasing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    RemoteCatalog,
    /// The build's own modules.
    Inferred,
    UserDefined,
}

impl fmt::Display for MappingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingSource::RemoteCatalog => "catalog",
            MappingSource::Inferred => "inferred",
            MappingSource::UserDefined => "user",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMappingEntry {
    pub module: ModuleName,
    pub coordinate: Coordinate,
    pub source: MappingSource,
}

/// Two entries of the same layer that map one module to different coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConflict {
    pub module: ModuleName,
    pub source: MappingSource,
    /// The first registered coordinate; it stays effective.
    pub kept: Coordinate,
    pub rejected: Coordinate,
}

impl MappingConflict {
    pub fn to_finding(&self) -> Finding {
        Finding::new(
            FindingKind::DuplicateMapping,
            Severity::Fatal,
            format!(
                "module `{}` is mapped to both {} and {} in the {} mappings",
                self.module, self.kept, self.rejected, self.source
            ),
        )
        .with_module(self.module.clone())
        .with_coordinate(self.kept.clone())
    }
}

/// Maps every module whose name starts with `prefix` to `group:<rest of the name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGroupRule {
    prefix: String,
    group: String,
}

impl PrefixGroupRule {
    pub fn new(prefix: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            group: group.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn apply(&self, module: &ModuleName) -> Option<Coordinate> {
        let artifact = module.as_str().strip_prefix(self.prefix.as_str())?;
        if artifact.is_empty() {
            return None;
        }
        Coordinate::new(self.group.as_str(), artifact).ok()
    }
}

/// A module produced by the build itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModule {
    pub module: ModuleName,
    pub group: String,
    pub project: String,
    pub source_set: String,
}

impl LocalModule {
    /// `group:project` for the main source set, `group:project-<source-set>` otherwise.
    pub fn coordinate(&self) -> Result<Coordinate, InvalidCoordinate> {
        let artifact = match naming::source_set_capability_suffix(&self.source_set) {
            Some(suffix) => format!("{}-{suffix}", self.project),
            None => self.project.clone(),
        };
        Coordinate::new(self.group.as_str(), artifact)
    }
}

#[derive(Debug, Default)]
pub struct MappingStoreBuilder {
    layers: BTreeMap<MappingSource, BTreeMap<ModuleName, Coordinate>>,
    conflicts: Vec<MappingConflict>,
    prefix_rules: Vec<PrefixGroupRule>,
}

impl MappingStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one mapping. Versions are dropped; the store only knows `group:artifact`.
    pub fn insert(
        &mut self,
        source: MappingSource,
        module: ModuleName,
        coordinate: Coordinate,
    ) -> &mut Self {
        let coordinate = coordinate.ga();
        let layer = self.layers.entry(source).or_default();
        match layer.get(&module) {
            None => {
                layer.insert(module, coordinate);
            }
            Some(existing) if *existing == coordinate => {}
            Some(existing) => {
                tracing::debug!(
                    target: "jmd.mapping",
                    module = %module,
                    source = %source,
                    kept = %existing,
                    rejected = %coordinate,
                    "conflicting mapping in one layer"
                );
                self.conflicts.push(MappingConflict {
                    module,
                    source,
                    kept: existing.clone(),
                    rejected: coordinate,
                });
            }
        }
        self
    }

    pub fn add_catalog(&mut self, catalog: &Catalog) -> &mut Self {
        for entry in catalog.entries() {
            self.insert(
                MappingSource::RemoteCatalog,
                entry.module.clone(),
                entry.coordinate.clone(),
            );
        }
        self
    }

    pub fn add_local_module(
        &mut self,
        local: &LocalModule,
    ) -> Result<&mut Self, InvalidCoordinate> {
        let coordinate = local.coordinate()?;
        Ok(self.insert(MappingSource::Inferred, local.module.clone(), coordinate))
    }

    pub fn add_user_mapping(&mut self, module: ModuleName, coordinate: Coordinate) -> &mut Self {
        self.insert(MappingSource::UserDefined, module, coordinate)
    }

    pub fn add_prefix_rule(&mut self, rule: PrefixGroupRule) -> &mut Self {
        self.prefix_rules.push(rule);
        self
    }

    pub fn build(self) -> MappingStore {
        let mut effective: BTreeMap<ModuleName, ModuleMappingEntry> = BTreeMap::new();
        // Layers iterate in increasing precedence.
        for (source, layer) in self.layers {
            for (module, coordinate) in layer {
                if let Some(previous) = effective.get(&module) {
                    tracing::debug!(
                        target: "jmd.mapping",
                        module = %module,
                        from = %previous.source,
                        to = %source,
                        previous = %previous.coordinate,
                        coordinate = %coordinate,
                        "mapping overridden by higher-precedence source"
                    );
                }
                effective.insert(
                    module.clone(),
                    ModuleMappingEntry {
                        module,
                        coordinate,
                        source,
                    },
                );
            }
        }

        let mut reverse: BTreeMap<String, ModuleName> = BTreeMap::new();
        for entry in effective.values() {
            reverse
                .entry(entry.coordinate.ga_string())
                .or_insert_with(|| entry.module.clone());
        }

        let mut prefix_rules = self.prefix_rules;
        // Longest prefix first so the most specific rule wins.
        prefix_rules.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then(a.prefix.cmp(&b.prefix))
        });

        tracing::debug!(
            target: "jmd.mapping",
            entries = effective.len(),
            conflicts = self.conflicts.len(),
            prefix_rules = prefix_rules.len(),
            "built mapping store"
        );

        MappingStore {
            effective,
            reverse,
            conflicts: self.conflicts,
            prefix_rules,
        }
    }
}

/// Resolved, read-only module name to coordinate mapping.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    effective: BTreeMap<ModuleName, ModuleMappingEntry>,
    reverse: BTreeMap<String, ModuleName>,
    conflicts: Vec<MappingConflict>,
    prefix_rules: Vec<PrefixGroupRule>,
}

impl MappingStore {
    pub fn builder() -> MappingStoreBuilder {
        MappingStoreBuilder::new()
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, module: &ModuleName) -> Option<&Coordinate> {
        self.effective.get(module).map(|e| &e.coordinate)
    }

    pub fn entry(&self, module: &ModuleName) -> Option<&ModuleMappingEntry> {
        self.effective.get(module)
    }

    /// The first module (in name order) mapped to the GA of `coordinate`.
    pub fn module_name_for(&self, coordinate: &Coordinate) -> Option<&ModuleName> {
        self.reverse.get(&coordinate.ga_string())
    }

    /// Coordinate derived from the most specific matching prefix rule.
    pub fn prefix_match(&self, module: &ModuleName) -> Option<Coordinate> {
        self.prefix_rules.iter().find_map(|rule| rule.apply(module))
    }

    /// Effective entries in module name order.
    pub fn entries(&self) -> impl Iterator<Item = &ModuleMappingEntry> {
        self.effective.values()
    }

    pub fn conflicts(&self) -> &[MappingConflict] {
        &self.conflicts
    }

    pub fn conflict_findings(&self) -> Vec<Finding> {
        self.conflicts.iter().map(MappingConflict::to_finding).collect()
    }

    pub fn len(&self) -> usize {
        self.effective.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effective.is_empty()
    }
}
