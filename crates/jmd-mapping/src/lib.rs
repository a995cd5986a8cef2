//! Java module name to `group:artifact` mapping.
//!
//! A [`MappingStore`] is assembled once per invocation from layered sources (catalog, the build's
//! own modules, user overrides) and is read-only afterwards.

pub mod catalog;
mod store;

pub use catalog::{
    Catalog, CatalogEntry, CatalogError, CatalogSource, EmbeddedCatalog, FileCatalog,
    InMemoryCatalog, RawCatalogEntry,
};
pub use store::{
    LocalModule, MappingConflict, MappingSource, MappingStore, MappingStoreBuilder,
    ModuleMappingEntry, PrefixGroupRule,
};
