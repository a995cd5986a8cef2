//! Translate a module declaration into dependency declarations.

use std::collections::BTreeSet;

use jmd_core::{
    ConfigurationBucket, Coordinate, DeclarationContext, Finding, FindingKind, ModuleName, Severity,
};
use jmd_mapping::MappingStore;
use jmd_modules::{jdk, BuildOnlyKind, DirectiveKind, ModuleDeclaration, RequiresDirective};
use jmd_versions::{ResolutionResults, VersionSourceAdapter};

use crate::host::DependencyDeclaration;

/// Bucket for a plain `requires` with the given qualifiers.
pub fn bucket_for(
    is_static: bool,
    is_transitive: bool,
    context: DeclarationContext,
) -> ConfigurationBucket {
    match (context, is_static, is_transitive) {
        (DeclarationContext::Main, true, _) => ConfigurationBucket::CompileOnly,
        (DeclarationContext::Main, false, true) => ConfigurationBucket::Api,
        (DeclarationContext::Main, false, false) => ConfigurationBucket::Implementation,
        (DeclarationContext::Test, true, _) => ConfigurationBucket::TestCompileOnly,
        (DeclarationContext::Test, false, _) => ConfigurationBucket::TestImplementation,
    }
}

/// Bucket for a `requires` directive, decided by its [`DirectiveKind`].
pub fn bucket_for_directive(
    directive: &RequiresDirective,
    context: DeclarationContext,
) -> ConfigurationBucket {
    match directive.kind() {
        DirectiveKind::RequiresRuntime => runtime_bucket(context),
        DirectiveKind::RequiresStatic | DirectiveKind::RequiresStaticTransitive => {
            bucket_for(true, directive.is_transitive, context)
        }
        DirectiveKind::RequiresTransitive => bucket_for(false, true, context),
        DirectiveKind::Requires => bucket_for(false, false, context),
    }
}

pub fn bucket_for_build_only(
    kind: BuildOnlyKind,
    context: DeclarationContext,
) -> ConfigurationBucket {
    match kind {
        BuildOnlyKind::RuntimeOnly => runtime_bucket(context),
        BuildOnlyKind::AnnotationProcessor => ConfigurationBucket::AnnotationProcessor,
    }
}

fn runtime_bucket(context: DeclarationContext) -> ConfigurationBucket {
    match context {
        DeclarationContext::Main => ConfigurationBucket::RuntimeOnly,
        DeclarationContext::Test => ConfigurationBucket::TestRuntimeOnly,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SynthesisOptions {
    /// Log a warning for every declaration no version could be found for.
    pub warn_for_missing_versions: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub declarations: Vec<DependencyDeclaration>,
    pub findings: Vec<Finding>,
}

impl Synthesis {
    /// GAs of all synthesized declarations.
    pub fn required_gas(&self) -> BTreeSet<String> {
        self.declarations
            .iter()
            .map(|d| d.coordinate.ga_string())
            .collect()
    }
}

pub struct Synthesizer<'a> {
    store: &'a MappingStore,
    versions: &'a VersionSourceAdapter,
    options: SynthesisOptions,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        store: &'a MappingStore,
        versions: &'a VersionSourceAdapter,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            store,
            versions,
            options,
        }
    }

    /// Derive the declarations of one unit. A missing mapping or an undecidable version becomes a
    /// finding and only the affected directive is skipped.
    pub fn synthesize(
        &self,
        decl: &ModuleDeclaration,
        context: DeclarationContext,
        results: &dyn ResolutionResults,
    ) -> Synthesis {
        let targets = decl
            .requires
            .iter()
            .map(|r| (&r.target, bucket_for_directive(r, context)))
            .chain(
                decl.build_only
                    .iter()
                    .map(|d| (&d.target, bucket_for_build_only(d.kind, context))),
            );

        let mut synthesis = Synthesis::default();
        let mut seen = BTreeSet::new();
        let mut reported_missing = BTreeSet::new();

        for (target, bucket) in targets {
            if jdk::is_platform_module(target.as_str()) {
                continue;
            }

            let Some(ga) = self.coordinate_for(target) else {
                if reported_missing.insert(target.clone()) {
                    tracing::warn!(
                        target: "jmd.deps",
                        module = %decl.name,
                        requires = %target,
                        "no mapping registered for module"
                    );
                    synthesis.findings.push(Finding::missing_mapping(target.clone()));
                }
                continue;
            };

            let resolution = match self.versions.resolve_version(&ga, results) {
                Ok(resolution) => resolution,
                Err(err) => {
                    tracing::warn!(
                        target: "jmd.deps",
                        module = %decl.name,
                        requires = %target,
                        error = %err,
                        "cannot choose a version"
                    );
                    let finding =
                        Finding::new(FindingKind::VersionConflict, Severity::Fatal, err.to_string())
                            .with_module(target.clone())
                            .with_coordinate(ga);
                    if !synthesis.findings.contains(&finding) {
                        synthesis.findings.push(finding);
                    }
                    continue;
                }
            };
            if !resolution.is_resolved() && self.options.warn_for_missing_versions {
                tracing::warn!(
                    target: "jmd.deps",
                    module = %decl.name,
                    requires = %target,
                    coordinate = %ga,
                    "no version defined for dependency"
                );
            }

            let declaration = DependencyDeclaration::new(bucket, resolution.apply(&ga));
            if seen.insert(declaration.clone()) {
                synthesis.declarations.push(declaration);
            }
        }

        tracing::debug!(
            target: "jmd.deps",
            module = %decl.name,
            context = ?context,
            declarations = synthesis.declarations.len(),
            findings = synthesis.findings.len(),
            "synthesized dependency declarations"
        );
        synthesis
    }

    fn coordinate_for(&self, module: &ModuleName) -> Option<Coordinate> {
        self.store
            .lookup(module)
            .cloned()
            .or_else(|| self.store.prefix_match(module))
    }
}
