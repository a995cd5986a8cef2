use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jmd_cli::{check, load_projects, synthesize_project, LoadedProject, Session};
use jmd_core::{DeclarationContext, ModuleName};
use jmd_deps::{
    analyze_module_path, build_file_dependencies, module_info_from_declared, rewrite_build_file,
    service_files, version_catalog, BuildFileStyle, CatalogLibrary, SourceSetDependencies,
};
use jmd_mapping::{Catalog, CatalogSource, FileCatalog, MappingStore};
use jmd_modules::{naming, ordering, MODULE_INFO_FILE};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "jmd",
    version,
    about = "Derive and check dependency declarations from Java module declarations"
)]
struct Cli {
    /// Config file (defaults to `jmd.toml` or `.jmd/config.toml` in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive dependencies for every unit of the given project snapshots and check them
    Check(CheckArgs),
    /// Print the effective module name to coordinate mappings
    Mappings(MappingsArgs),
    /// Build or verify module catalogs
    Catalog(CatalogArgs),
    /// Check directive order of all `module-info.java` files below a directory
    Order(OrderArgs),
    /// Generate build files from declared dependencies
    Generate(GenerateArgs),
    /// Classify the resolved dependencies of a project by their module names
    Analyze(AnalyzeArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Project snapshot files exported by the build tool
    #[arg(required = true)]
    snapshots: Vec<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct MappingsArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CatalogArgs {
    #[command(subcommand)]
    command: CatalogCommand,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Reduce an upstream `module=<repository path>` listing to a unique snapshot catalog
    Build {
        upstream: PathBuf,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a snapshot catalog and report conflicting entries
    Verify { catalog: PathBuf },
}

#[derive(Args)]
struct OrderArgs {
    /// Directory to search
    #[arg(default_value = ".")]
    root: PathBuf,
    /// Module name prefix of the build's own modules, listed first
    #[arg(long)]
    own_prefix: Option<String>,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateCommand,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Print a `module-info.java` for a source set derived from its declared dependencies
    ModuleInfo {
        snapshot: PathBuf,
        #[arg(long, default_value = naming::MAIN_SOURCE_SET)]
        source_set: String,
    },
    /// Print a `[libraries]` version catalog for the declared dependencies of all snapshots
    Catalog {
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Group whose modules are left out (defaults to the first snapshot's group)
        #[arg(long)]
        own_group: Option<String>,
    },
    /// Print a `dependencies {}` block derived from the project's module declarations
    BuildDeps {
        snapshot: PathBuf,
        /// Snapshots of other projects of the build, so their modules become project dependencies
        #[arg(long = "sibling")]
        siblings: Vec<PathBuf>,
        /// Use version catalog accessors (`projects.x`, `libs.<module>`)
        #[arg(long)]
        catalog: bool,
        /// Rewrite the dependencies block of this build file instead of printing it
        #[arg(long)]
        build_file: Option<PathBuf>,
    },
    /// Write `META-INF/services` files for the `provides` directives of a source set
    Services {
        snapshot: PathBuf,
        #[arg(long, default_value = naming::MAIN_SOURCE_SET)]
        source_set: String,
        /// Resource directory that receives `META-INF/services`
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    snapshot: PathBuf,
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let session = Session::open(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Check(args) => {
            let projects = load_projects(&args.snapshots)?;
            let outcome = check(&session, &projects)?;
            if args.json {
                print_json(&outcome)?;
            } else {
                for finding in &outcome.mapping_conflicts {
                    println!("mappings: {finding}");
                    println!("    hint: {}", finding.remediation());
                }
                for report in &outcome.reports {
                    print!("{report}");
                }
                println!(
                    "summary: {} unit(s), {} fatal, {} advisory",
                    outcome.reports.len(),
                    outcome.fatal_count(),
                    outcome.advisory_count()
                );
            }
            Ok(if outcome.is_fatal() { 1 } else { 0 })
        }
        Command::Mappings(args) => {
            let store = session.store(&[])?;
            if args.json {
                let entries: Vec<_> = store.entries().collect();
                print_json(&entries)?;
            } else {
                for entry in store.entries() {
                    println!("{} = {} ({})", entry.module, entry.coordinate, entry.source);
                }
            }
            Ok(0)
        }
        Command::Catalog(args) => match args.command {
            CatalogCommand::Build { upstream, output } => {
                let source = FileCatalog::new(&upstream);
                let catalog = Catalog::from_upstream(&source.origin(), source.load()?)?;
                let text = catalog.to_snapshot();
                match output {
                    Some(path) => {
                        std::fs::write(&path, text)
                            .with_context(|| format!("failed to write {}", path.display()))?;
                        eprintln!(
                            "catalog: {} entries written to {}",
                            catalog.len(),
                            path.display()
                        );
                    }
                    None => print!("{text}"),
                }
                Ok(0)
            }
            CatalogCommand::Verify { catalog } => {
                let catalog_path = catalog;
                let catalog = Catalog::load(&FileCatalog::new(&catalog_path))?;
                let mut builder = MappingStore::builder();
                builder.add_catalog(&catalog);
                let store = builder.build();
                for finding in store.conflict_findings() {
                    println!("{finding}");
                }
                println!(
                    "catalog: {} entries, {} conflict(s)",
                    catalog.len(),
                    store.conflicts().len()
                );
                Ok(if store.conflicts().is_empty() { 0 } else { 1 })
            }
        },
        Command::Order(args) => {
            let violations = check_order(&args.root, args.own_prefix.as_deref())?;
            for (path, violation) in &violations {
                print!("{}: {violation}", path.display());
            }
            Ok(if violations.is_empty() { 0 } else { 1 })
        }
        Command::Generate(args) => match args.command {
            GenerateCommand::ModuleInfo {
                snapshot,
                source_set,
            } => {
                let project = LoadedProject::load(&snapshot)?;
                let store = session.store(&project.local_modules())?;
                let (name, context) = module_for_source_set(&project, &source_set)?;
                print!(
                    "{}",
                    module_info_from_declared(&name, &project.snapshot.declared, context, &store)
                );
                Ok(0)
            }
            GenerateCommand::Catalog {
                snapshots,
                own_group,
            } => {
                let projects = load_projects(&snapshots)?;
                let local_modules: Vec<_> =
                    projects.iter().flat_map(LoadedProject::local_modules).collect();
                let store = session.store(&local_modules)?;
                let own_group = own_group
                    .or_else(|| projects.first().map(|p| p.snapshot.group.clone()))
                    .unwrap_or_default();
                print!("{}", version_catalog(catalog_libraries(&projects, &store), &own_group));
                Ok(0)
            }
            GenerateCommand::BuildDeps {
                snapshot,
                siblings,
                catalog,
                build_file,
            } => {
                let project = LoadedProject::load(&snapshot)?;
                warn_unprocessed(&project);
                let siblings = load_projects(&siblings)?;
                let local_modules: Vec<_> = std::iter::once(&project)
                    .chain(&siblings)
                    .flat_map(LoadedProject::local_modules)
                    .collect();
                let store = session.store(&local_modules)?;

                let mut source_sets = Vec::new();
                for (unit, synthesis) in synthesize_project(&session, &store, &project)? {
                    for finding in &synthesis.findings {
                        eprintln!("warning: {}: {finding}", unit.id());
                    }
                    source_sets.push(SourceSetDependencies {
                        source_set: unit.source_set.clone(),
                        declarations: synthesis.declarations,
                    });
                }
                let block = build_file_dependencies(
                    &source_sets,
                    &local_modules,
                    &store,
                    BuildFileStyle {
                        with_catalog: catalog,
                    },
                );
                match build_file {
                    Some(path) => {
                        let existing = std::fs::read_to_string(&path)
                            .with_context(|| format!("failed to read {}", path.display()))?;
                        std::fs::write(&path, rewrite_build_file(&existing, &block))
                            .with_context(|| format!("failed to write {}", path.display()))?;
                        eprintln!("dependencies written to {}", path.display());
                    }
                    None => print!("{block}"),
                }
                Ok(0)
            }
            GenerateCommand::Services {
                snapshot,
                source_set,
                output,
            } => {
                let project = LoadedProject::load(&snapshot)?;
                warn_unprocessed(&project);
                let unit = project
                    .units
                    .iter()
                    .find(|u| u.source_set == source_set)
                    .with_context(|| {
                        format!(
                            "source set `{source_set}` of project {} has no module declaration",
                            project.snapshot.project
                        )
                    })?;
                let files = service_files(&unit.declaration);
                for (relative, content) in &files {
                    let path = output.join(relative);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(&path, content)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                }
                eprintln!("services: {} file(s) written to {}", files.len(), output.display());
                Ok(0)
            }
        },
        Command::Analyze(args) => {
            let project = LoadedProject::load(&args.snapshot)?;
            let store = session.store(&project.local_modules())?;
            let analysis = analyze_module_path(&project.snapshot, &store);
            if args.json {
                print_json(&analysis)?;
            } else {
                print!("{analysis}");
            }
            Ok(0)
        }
    }
}

fn warn_unprocessed(project: &LoadedProject) {
    for report in project.unprocessed.iter().filter(|r| r.error.is_some()) {
        eprint!("warning: {report}");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

/// Directive order violations of every `module-info.java` below `root`, in path order.
fn check_order(
    root: &Path,
    own_prefix: Option<&str>,
) -> Result<Vec<(PathBuf, ordering::OrderViolation)>> {
    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0
                || !(name.starts_with('.') || name == "build" || name == "target")
        });
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == MODULE_INFO_FILE {
            files.push(entry.into_path());
        }
    }

    let mut violations = Vec::new();
    for path in files {
        let parsed = jmd_modules::reader::read_file(&path)?;
        violations.extend(
            ordering::check_directive_order(&parsed.declaration, own_prefix)
                .into_iter()
                .map(|violation| (path.clone(), violation)),
        );
    }
    Ok(violations)
}

/// Module name and context of `source_set`: its declaration when it has one, the naming
/// convention otherwise.
fn module_for_source_set(
    project: &LoadedProject,
    source_set: &str,
) -> Result<(ModuleName, DeclarationContext)> {
    let snapshot_source_set = project.snapshot.source_set(source_set).with_context(|| {
        format!(
            "project {} has no source set `{source_set}`",
            project.snapshot.project
        )
    })?;
    let context = snapshot_source_set.context();
    if let Some(unit) = project.units.iter().find(|u| u.source_set == source_set) {
        return Ok((unit.declaration.name.clone(), context));
    }
    let name = naming::source_set_to_module_name(&project.snapshot.project, source_set);
    let name = ModuleName::parse(name.as_str())
        .with_context(|| format!("cannot derive a module name for {source_set}"))?;
    Ok((name, context))
}

/// Declared coordinates with a known module name. GA-only coordinates take the version they
/// resolved to, if any.
fn catalog_libraries(projects: &[LoadedProject], store: &MappingStore) -> Vec<CatalogLibrary> {
    projects
        .iter()
        .flat_map(|project| {
            let snapshot = &project.snapshot;
            snapshot.declared.values().flatten().filter_map(move |coordinate| {
                let module = store.module_name_for(coordinate)?.clone();
                let coordinate = match coordinate.version() {
                    Some(_) => coordinate.clone(),
                    None => snapshot
                        .all_resolved()
                        .into_iter()
                        .find(|c| c.coordinate.same_ga(coordinate))
                        .map(|c| coordinate.ga().with_version(c.version.as_str()))
                        .unwrap_or_else(|| coordinate.clone()),
                };
                Some(CatalogLibrary::new(module, coordinate))
            })
        })
        .collect()
}
