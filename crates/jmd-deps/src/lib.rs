//! Dependency derivation and validation for JPMS units.
//!
//! A unit's [`ModuleDeclaration`](jmd_modules::ModuleDeclaration) is turned into dependency
//! declarations by the [`Synthesizer`], handed to the host through a [`DependencyHandler`], and
//! cross-checked against the host's declared and resolved graph by the [`Validator`]. The
//! [`Pipeline`] runs both for one unit and aggregates everything into a [`UnitReport`].

pub mod analysis;
pub mod generate;
mod host;
mod report;
pub mod snapshot;
mod synthesize;
mod unit;
mod validate;

pub use analysis::{analyze_module_path, ModulePathAnalysis};
pub use generate::{
    build_file_dependencies, module_info_from_declared, rewrite_build_file, service_files,
    version_catalog, BuildFileStyle, CatalogLibrary, SourceSetDependencies,
};
pub use host::{DependencyDeclaration, DependencyHandler, RecordingHandler, Registrar};
pub use report::UnitReport;
pub use snapshot::{ProjectSnapshot, ResolvedComponent, SnapshotError, SourceSetSnapshot};
pub use synthesize::{
    bucket_for, bucket_for_build_only, bucket_for_directive, Synthesis,
    SynthesisOptions, Synthesizer,
};
pub use unit::{Pipeline, Unit, UnitError};
pub use validate::{ValidationOptions, Validator};
