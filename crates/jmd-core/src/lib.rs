//! Core shared types for the module dependency engine.
//!
//! This crate is intentionally small: names, coordinates, configuration buckets and findings.
//! Everything else builds on top of it.

mod bucket;
mod coordinate;
mod finding;
mod name;

pub use bucket::{ConfigurationBucket, DeclarationContext};
pub use coordinate::{Coordinate, InvalidCoordinate};
pub use finding::{Finding, FindingKind, Severity};
pub use name::{InvalidModuleName, ModuleName};
