//! Generators that go from the host's declarations back to module-level artifacts.

use std::collections::{BTreeMap, BTreeSet};

use jmd_core::{ConfigurationBucket, Coordinate, DeclarationContext, ModuleName};
use jmd_mapping::{LocalModule, MappingStore};
use jmd_modules::render::{render_module_info, RenderEntry};
use jmd_modules::{naming, DirectiveKind, ModuleDeclaration};

use crate::host::DependencyDeclaration;

/// Directive kind a dependency in `bucket` is written as, if the bucket belongs to `context`.
fn directive_for(
    bucket: ConfigurationBucket,
    context: DeclarationContext,
) -> Option<DirectiveKind> {
    if bucket.context() != Some(context) {
        return None;
    }
    match bucket {
        ConfigurationBucket::Api => Some(DirectiveKind::RequiresTransitive),
        ConfigurationBucket::Implementation | ConfigurationBucket::TestImplementation => {
            Some(DirectiveKind::Requires)
        }
        ConfigurationBucket::CompileOnly | ConfigurationBucket::TestCompileOnly => {
            Some(DirectiveKind::RequiresStatic)
        }
        ConfigurationBucket::RuntimeOnly | ConfigurationBucket::TestRuntimeOnly => {
            Some(DirectiveKind::RequiresRuntime)
        }
        ConfigurationBucket::AnnotationProcessor => None,
    }
}

/// Write a `module-info.java` for the dependencies the host currently declares. Coordinates the
/// store has no module name for are kept as commented-out directives.
pub fn module_info_from_declared(
    name: &ModuleName,
    declared: &BTreeMap<ConfigurationBucket, Vec<Coordinate>>,
    context: DeclarationContext,
    store: &MappingStore,
) -> String {
    let mut blocks: Vec<(DirectiveKind, Vec<RenderEntry>)> = Vec::new();
    for (bucket, coordinates) in declared {
        let Some(kind) = directive_for(*bucket, context) else {
            continue;
        };
        let entries = coordinates
            .iter()
            .map(|coordinate| match store.module_name_for(coordinate) {
                Some(module) => RenderEntry::Module(module.clone()),
                None => {
                    tracing::info!(
                        target: "jmd.deps",
                        coordinate = %coordinate,
                        "skipping dependency without mapping, run `jmd analyze` for details"
                    );
                    RenderEntry::Unmapped(coordinate.ga_string())
                }
            })
            .collect();
        blocks.push((kind, entries));
    }
    render_module_info(name, &blocks)
}

/// One library of a generated version catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLibrary {
    pub module: ModuleName,
    /// Version included when present.
    pub coordinate: Coordinate,
}

impl CatalogLibrary {
    pub fn new(module: ModuleName, coordinate: Coordinate) -> Self {
        Self { module, coordinate }
    }
}

/// Render a `[libraries]` table, one line per module, aliases derived from the module name.
///
/// Each module appears once; an entry with a version wins over one without. Libraries of
/// `own_group` are built locally and never listed.
pub fn version_catalog(
    libraries: impl IntoIterator<Item = CatalogLibrary>,
    own_group: &str,
) -> String {
    let mut libraries: Vec<CatalogLibrary> = libraries.into_iter().collect();
    libraries.sort_by_key(|l| !l.coordinate.is_gav());

    let mut seen = BTreeSet::new();
    let mut lines: Vec<String> = libraries
        .into_iter()
        .filter(|l| seen.insert(l.module.clone()))
        .filter(|l| l.coordinate.group() != own_group)
        .map(|l| {
            let mut notation = toml::map::Map::new();
            notation.insert(
                "module".to_string(),
                toml::Value::String(l.coordinate.ga_string()),
            );
            if let Some(version) = l.coordinate.version() {
                notation.insert("version".to_string(), toml::Value::String(version.to_string()));
            }
            format!(
                "{} = {}",
                l.module.as_str().replace('.', "-"),
                toml::Value::Table(notation)
            )
        })
        .collect();
    lines.sort();

    let mut out = String::from("[libraries]\n");
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Synthesized declarations of one source set, the input of [`build_file_dependencies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSetDependencies {
    pub source_set: String,
    pub declarations: Vec<DependencyDeclaration>,
}

/// How dependencies are spelled in a generated `dependencies {}` block.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildFileStyle {
    /// `projects.x` and `libs.<module>` accessors instead of `project(":x")` and string notation.
    pub with_catalog: bool,
}

/// Render a Gradle `dependencies {}` block. The main source set comes first, the others follow
/// by name; inside a source set, declarations are grouped by bucket and keep directive order.
pub fn build_file_dependencies(
    source_sets: &[SourceSetDependencies],
    local_modules: &[LocalModule],
    store: &MappingStore,
    style: BuildFileStyle,
) -> String {
    let mut source_sets: Vec<&SourceSetDependencies> =
        source_sets.iter().filter(|s| !s.declarations.is_empty()).collect();
    source_sets.sort_by_key(|s| (s.source_set != naming::MAIN_SOURCE_SET, s.source_set.clone()));

    let local: Vec<(Coordinate, &LocalModule)> = local_modules
        .iter()
        .filter_map(|m| Some((m.coordinate().ok()?, m)))
        .collect();

    let mut blocks = Vec::new();
    for source_set in source_sets {
        let mut declarations: Vec<&DependencyDeclaration> =
            source_set.declarations.iter().collect();
        declarations.sort_by_key(|d| d.bucket);
        let lines: Vec<String> = declarations
            .into_iter()
            .map(|d| {
                let local = local.iter().find(|(c, _)| c.same_ga(&d.coordinate)).map(|(_, m)| *m);
                declaration_line(d, local, store, style)
            })
            .collect();
        blocks.push(lines.join("\n"));
    }

    if blocks.is_empty() {
        return String::new();
    }
    format!("dependencies {{\n{}\n}}\n", blocks.join("\n\n"))
}

fn declaration_line(
    declaration: &DependencyDeclaration,
    local: Option<&LocalModule>,
    store: &MappingStore,
    style: BuildFileStyle,
) -> String {
    let coordinate = &declaration.coordinate;
    let (identifier, capability) = match local {
        Some(module) => {
            let identifier = if style.with_catalog {
                format!("projects.{}", module.project)
            } else {
                format!("project(\":{}\")", module.project)
            };
            let capability = naming::source_set_capability_suffix(&module.source_set)
                .map(|_| coordinate.ga_string());
            (identifier, capability)
        }
        None => match store.module_name_for(coordinate) {
            Some(module) if style.with_catalog => (format!("libs.{module}"), None),
            _ => (format!("\"{coordinate}\""), None),
        },
    };
    match capability {
        Some(capability) => format!(
            "    {}({identifier}) {{ capabilities {{ requireCapabilities(\"{capability}\") }} }}",
            declaration.bucket
        ),
        None => format!("    {}({identifier})", declaration.bucket),
    }
}

/// Replace everything from the first line mentioning `dependencies` with `block`.
pub fn rewrite_build_file(existing: &str, block: &str) -> String {
    let kept: Vec<&str> = existing
        .lines()
        .take_while(|line| !line.contains("dependencies"))
        .collect();
    let mut out = kept.join("\n");
    while out.ends_with('\n') {
        out.pop();
    }
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(block);
    out
}

/// `META-INF/services/<service>` files for the `provides` directives of `decl`, as relative path
/// and content (one implementation per line).
pub fn service_files(decl: &ModuleDeclaration) -> Vec<(String, String)> {
    decl.provides
        .iter()
        .map(|(service, implementations)| {
            (format!("META-INF/services/{service}"), implementations.join("\n"))
        })
        .collect()
}
