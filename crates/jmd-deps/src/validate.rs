//! Cross-checks between a unit's module declaration and what the host graph declares and resolves.

use std::collections::{BTreeMap, BTreeSet};

use jmd_core::{
    ConfigurationBucket, Coordinate, DeclarationContext, Finding, FindingKind, ModuleName, Severity,
};
use jmd_mapping::{MappingConflict, MappingStore};
use jmd_modules::{ordering, ModuleDeclaration};
use jmd_versions::VersionSourceAdapter;

use crate::snapshot::{ProjectSnapshot, ResolvedComponent};
use crate::synthesize::Synthesis;

#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Unused declared dependencies are fatal instead of advisory.
    pub strict_unused: bool,
    pub directive_order: bool,
    /// Module name prefix shared by the build's own modules, listed first in every block.
    pub own_prefix: Option<String>,
    /// GAs that may be declared without a matching `requires`.
    pub runtime_exceptions: BTreeSet<String>,
}

pub struct Validator<'a> {
    store: &'a MappingStore,
    versions: &'a VersionSourceAdapter,
    options: &'a ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(
        store: &'a MappingStore,
        versions: &'a VersionSourceAdapter,
        options: &'a ValidationOptions,
    ) -> Self {
        Self {
            store,
            versions,
            options,
        }
    }

    /// Run every check. Findings are collected in check order; nothing short-circuits.
    ///
    /// Mapping conflicts only show up here for modules the unit requires. The full list belongs
    /// to the run, see [`MappingStore::conflict_findings`].
    pub fn validate(
        &self,
        decl: &ModuleDeclaration,
        synthesis: &Synthesis,
        snapshot: &ProjectSnapshot,
        context: DeclarationContext,
    ) -> Vec<Finding> {
        let mut findings = synthesis.findings.clone();
        let required: BTreeSet<&ModuleName> = decl.required_modules().into_iter().collect();
        findings.extend(
            self.store
                .conflicts()
                .iter()
                .filter(|conflict| required.contains(&conflict.module))
                .map(MappingConflict::to_finding),
        );
        findings.extend(self.unused_declared(decl, synthesis, snapshot, context));
        findings.extend(self.version_conflicts(synthesis, snapshot, context));
        if self.options.directive_order {
            findings.extend(
                ordering::check_directive_order(decl, self.options.own_prefix.as_deref())
                    .into_iter()
                    .map(|violation| violation.into_finding(decl.name.clone())),
            );
        }

        tracing::debug!(
            target: "jmd.deps",
            module = %decl.name,
            findings = findings.len(),
            fatal = findings.iter().filter(|f| f.is_fatal()).count(),
            "validated unit"
        );
        findings
    }

    fn unused_declared(
        &self,
        decl: &ModuleDeclaration,
        synthesis: &Synthesis,
        snapshot: &ProjectSnapshot,
        context: DeclarationContext,
    ) -> Vec<Finding> {
        let required = synthesis.required_gas();
        let platforms = self.versions.platform_coordinates();
        let severity = if self.options.strict_unused {
            Severity::Fatal
        } else {
            Severity::Advisory
        };

        let mut reported = BTreeSet::new();
        let mut findings = Vec::new();
        for bucket in ConfigurationBucket::ALL {
            if bucket.context() != Some(context) || bucket.is_runtime_only() {
                continue;
            }
            for coordinate in snapshot.declared_in(bucket) {
                let ga = coordinate.ga_string();
                if required.contains(&ga)
                    || self.options.runtime_exceptions.contains(&ga)
                    || platforms.iter().any(|p| p.same_ga(coordinate))
                    || self.provides_service_of(coordinate, decl)
                    || !reported.insert(ga)
                {
                    continue;
                }

                let mut finding = Finding::new(
                    FindingKind::UnusedDeclared,
                    severity,
                    format!(
                        "{} is declared in {bucket} but no directive of {} requires it",
                        coordinate.ga_string(),
                        decl.name
                    ),
                )
                .with_coordinate(coordinate.clone());
                if let Some(module) = self.store.module_name_for(coordinate) {
                    finding = finding.with_module(module.clone());
                }
                findings.push(finding);
            }
        }
        findings
    }

    // A dependency that only contributes service implementations is not named by `requires`.
    fn provides_service_of(&self, coordinate: &Coordinate, decl: &ModuleDeclaration) -> bool {
        let Some(module) = self.store.module_name_for(coordinate) else {
            return false;
        };
        decl.service_types().any(|service| module.is_prefix_of(service))
    }

    fn version_conflicts(
        &self,
        synthesis: &Synthesis,
        snapshot: &ProjectSnapshot,
        context: DeclarationContext,
    ) -> Vec<Finding> {
        let (compile, runtime) = context.sibling_classpaths();
        let mut findings = Vec::new();
        let mut reported = BTreeSet::new();

        if let (Some(compile_resolved), Some(runtime_resolved)) = (
            snapshot.resolved_configuration(compile),
            snapshot.resolved_configuration(runtime),
        ) {
            let runtime_versions = versions_by_ga(runtime_resolved);
            for component in compile_resolved {
                let ga = component.coordinate.ga_string();
                let Some(runtime_version) = runtime_versions.get(&ga) else {
                    continue;
                };
                if *runtime_version == component.version
                    || self.versions.is_conflict_excepted(&component.coordinate)
                    || !reported.insert(ga.clone())
                {
                    continue;
                }
                findings.push(
                    Finding::new(
                        FindingKind::VersionConflict,
                        Severity::Fatal,
                        format!(
                            "{ga} resolves to {} in {compile} but to {runtime_version} in {runtime}",
                            component.version
                        ),
                    )
                    .with_coordinate(component.coordinate.ga()),
                );
            }
        }

        for declaration in &synthesis.declarations {
            let coordinate = &declaration.coordinate;
            if coordinate.is_gav() || self.versions.is_conflict_excepted(coordinate) {
                continue;
            }
            for configuration in classpaths_of(declaration.bucket, context) {
                let Some(resolved) = snapshot.resolved_configuration(configuration) else {
                    continue;
                };
                if resolved.iter().any(|c| c.coordinate.same_ga(coordinate)) {
                    continue;
                }
                if !reported.insert(coordinate.ga_string()) {
                    break;
                }
                let mut finding = Finding::new(
                    FindingKind::VersionConflict,
                    Severity::Fatal,
                    format!(
                        "no version of {} was resolved in {configuration}",
                        coordinate.ga_string()
                    ),
                )
                .with_coordinate(coordinate.clone());
                if let Some(module) = self.store.module_name_for(coordinate) {
                    finding = finding.with_module(module.clone());
                }
                findings.push(finding);
                break;
            }
        }
        findings
    }
}

fn versions_by_ga(components: &[ResolvedComponent]) -> BTreeMap<String, &str> {
    let mut versions = BTreeMap::new();
    for component in components {
        versions
            .entry(component.coordinate.ga_string())
            .or_insert(component.version.as_str());
    }
    versions
}

/// Resolved configurations a declaration in `bucket` ends up on.
fn classpaths_of(bucket: ConfigurationBucket, context: DeclarationContext) -> Vec<&'static str> {
    let (compile, runtime) = context.sibling_classpaths();
    match bucket {
        ConfigurationBucket::CompileOnly | ConfigurationBucket::TestCompileOnly => vec![compile],
        ConfigurationBucket::RuntimeOnly | ConfigurationBucket::TestRuntimeOnly => vec![runtime],
        ConfigurationBucket::AnnotationProcessor => Vec::new(),
        ConfigurationBucket::Api
        | ConfigurationBucket::Implementation
        | ConfigurationBucket::TestImplementation => vec![compile, runtime],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DependencyDeclaration;
    use jmd_versions::{Version, VersionSource};
    use pretty_assertions::assert_eq;

    fn module(name: &str) -> ModuleName {
        ModuleName::parse(name).unwrap()
    }

    fn ga(text: &str) -> Coordinate {
        Coordinate::parse(text).unwrap()
    }

    fn component(coordinate: &str, version: &str) -> ResolvedComponent {
        ResolvedComponent {
            coordinate: ga(coordinate),
            version: version.to_string(),
            module_name: None,
            automatic: false,
        }
    }

    fn store() -> MappingStore {
        let mut builder = MappingStore::builder();
        builder
            .add_user_mapping(module("org.slf4j"), ga("org.slf4j:slf4j-api"))
            .add_user_mapping(module("org.apache.xmlbeans"), ga("org.apache.xmlbeans:xmlbeans"))
            .add_user_mapping(module("com.google.gson"), ga("com.google.code.gson:gson"));
        builder.build()
    }

    fn synthesis_of(declarations: &[(ConfigurationBucket, &str)]) -> Synthesis {
        Synthesis {
            declarations: declarations
                .iter()
                .map(|(bucket, c)| DependencyDeclaration::new(*bucket, ga(c)))
                .collect(),
            findings: Vec::new(),
        }
    }

    fn kinds(findings: &[Finding]) -> Vec<(FindingKind, Severity)> {
        findings.iter().map(|f| (f.kind, f.severity)).collect()
    }

    #[test]
    fn unused_declarations_follow_strictness() {
        let decl = ModuleDeclaration::builder(module("org.example.app"))
            .requires(module("org.slf4j"))
            .build();
        let mut snapshot = ProjectSnapshot::default();
        snapshot.declared.insert(
            ConfigurationBucket::Implementation,
            vec![ga("org.slf4j:slf4j-api"), ga("org.apache.xmlbeans:xmlbeans")],
        );
        snapshot.declared.insert(
            ConfigurationBucket::RuntimeOnly,
            vec![ga("org.slf4j:slf4j-simple")],
        );
        let synthesis =
            synthesis_of(&[(ConfigurationBucket::Implementation, "org.slf4j:slf4j-api")]);
        let store = store();
        let versions = VersionSourceAdapter::default();

        let lenient = ValidationOptions::default();
        let findings = Validator::new(&store, &versions, &lenient).validate(
            &decl,
            &synthesis,
            &snapshot,
            DeclarationContext::Main,
        );
        assert_eq!(kinds(&findings), vec![(FindingKind::UnusedDeclared, Severity::Advisory)]);
        assert_eq!(findings[0].module, Some(module("org.apache.xmlbeans")));

        let strict = ValidationOptions {
            strict_unused: true,
            ..ValidationOptions::default()
        };
        let findings = Validator::new(&store, &versions, &strict).validate(
            &decl,
            &synthesis,
            &snapshot,
            DeclarationContext::Main,
        );
        assert_eq!(kinds(&findings), vec![(FindingKind::UnusedDeclared, Severity::Fatal)]);

        let findings = Validator::new(&store, &versions, &strict).validate(
            &decl,
            &synthesis,
            &snapshot,
            DeclarationContext::Test,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn unused_exceptions() {
        let decl = ModuleDeclaration::builder(module("org.example.app"))
            .uses("com.google.gson.TypeAdapterFactory")
            .build();
        let mut snapshot = ProjectSnapshot::default();
        snapshot.declared.insert(
            ConfigurationBucket::Implementation,
            vec![
                ga("com.google.code.gson:gson"),
                ga("org.example:platform"),
                ga("org.apache.xmlbeans:xmlbeans"),
            ],
        );
        let store = store();
        let versions =
            VersionSourceAdapter::new([VersionSource::platform(&ga("org.example:platform"))]);
        let options = ValidationOptions {
            strict_unused: true,
            runtime_exceptions: ["org.apache.xmlbeans:xmlbeans".to_string()].into(),
            ..ValidationOptions::default()
        };

        let findings = Validator::new(&store, &versions, &options).validate(
            &decl,
            &Synthesis::default(),
            &snapshot,
            DeclarationContext::Main,
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn sibling_classpaths_must_agree_unless_excepted() {
        let decl = ModuleDeclaration::builder(module("org.example.app")).build();
        let mut snapshot = ProjectSnapshot::default();
        snapshot.resolved.insert(
            "compileClasspath".to_string(),
            vec![
                component("org.slf4j:slf4j-api", "2.0.9"),
                component("com.google.code.gson:gson", "2.10.1"),
            ],
        );
        snapshot.resolved.insert(
            "runtimeClasspath".to_string(),
            vec![
                component("org.slf4j:slf4j-api", "2.0.13"),
                component("com.google.code.gson:gson", "2.10.1"),
            ],
        );
        let store = store();
        let options = ValidationOptions::default();

        let versions = VersionSourceAdapter::default();
        let findings = Validator::new(&store, &versions, &options).validate(
            &decl,
            &Synthesis::default(),
            &snapshot,
            DeclarationContext::Main,
        );
        assert_eq!(kinds(&findings), vec![(FindingKind::VersionConflict, Severity::Fatal)]);
        assert_eq!(findings[0].coordinate, Some(ga("org.slf4j:slf4j-api")));

        let excepted =
            VersionSourceAdapter::new([VersionSource::consistent_resolution("runtimeClasspath")])
                .with_conflict_exception(&ga("org.slf4j:slf4j-api"));
        let findings = Validator::new(&store, &excepted, &options).validate(
            &decl,
            &Synthesis::default(),
            &snapshot,
            DeclarationContext::Main,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn unversioned_declaration_missing_from_resolution_is_a_conflict() {
        let decl = ModuleDeclaration::builder(module("org.example.app"))
            .requires(module("org.slf4j"))
            .requires(module("com.google.gson"))
            .build();
        let mut snapshot = ProjectSnapshot::default();
        snapshot.resolved.insert(
            "compileClasspath".to_string(),
            vec![component("com.google.code.gson:gson", "2.10.1")],
        );
        let synthesis = synthesis_of(&[
            (ConfigurationBucket::Implementation, "org.slf4j:slf4j-api"),
            (ConfigurationBucket::Implementation, "com.google.code.gson:gson"),
        ]);
        let store = store();
        let versions = VersionSourceAdapter::default();
        let options = ValidationOptions::default();

        let findings = Validator::new(&store, &versions, &options).validate(
            &decl,
            &synthesis,
            &snapshot,
            DeclarationContext::Main,
        );
        assert_eq!(kinds(&findings), vec![(FindingKind::VersionConflict, Severity::Fatal)]);
        assert_eq!(findings[0].module, Some(module("org.slf4j")));
        assert!(findings[0].detail.contains("compileClasspath"));

        let pinned = VersionSourceAdapter::new([VersionSource::literal()])
            .with_pin(&ga("org.slf4j:slf4j-api"), Version::parse("2.0.9").unwrap());
        let synthesis =
            synthesis_of(&[(ConfigurationBucket::Implementation, "org.slf4j:slf4j-api:2.0.9")]);
        let findings = Validator::new(&store, &pinned, &options).validate(
            &decl,
            &synthesis,
            &snapshot,
            DeclarationContext::Main,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn store_conflicts_and_directive_order_are_reported() {
        let decl = ModuleDeclaration::builder(module("org.example.app"))
            .requires(module("org.slf4j"))
            .requires(module("org.example.core"))
            .requires_static(module("com.fasterxml.jackson.databind"))
            .build();
        let mut builder = MappingStore::builder();
        let databind = module("com.fasterxml.jackson.databind");
        builder
            .add_user_mapping(databind.clone(), ga("com.fasterxml.jackson.core:jackson-databind"))
            .add_user_mapping(databind, ga("com.fasterxml.jackson.core:jackson-core"));
        let store = builder.build();
        let versions = VersionSourceAdapter::default();
        let options = ValidationOptions {
            directive_order: true,
            own_prefix: Some("org.example.".to_string()),
            ..ValidationOptions::default()
        };

        let findings = Validator::new(&store, &versions, &options).validate(
            &decl,
            &Synthesis::default(),
            &ProjectSnapshot::default(),
            DeclarationContext::Main,
        );
        assert_eq!(
            kinds(&findings),
            vec![
                (FindingKind::DuplicateMapping, Severity::Fatal),
                (FindingKind::DirectiveOrder, Severity::Fatal),
            ]
        );
        assert!(findings[1].detail.contains("requires org.example.core;\n    requires org.slf4j;"));
        assert_eq!(findings[0].module, Some(module("com.fasterxml.jackson.databind")));

        let unrelated = ModuleDeclaration::builder(module("org.example.other"))
            .requires(module("org.slf4j"))
            .build();
        let findings = Validator::new(&store, &versions, &options).validate(
            &unrelated,
            &Synthesis::default(),
            &ProjectSnapshot::default(),
            DeclarationContext::Main,
        );
        assert!(findings.is_empty(), "{findings:?}");
    }
}
