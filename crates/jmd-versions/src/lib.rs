//! Dependency versions and the sources they are resolved from.

mod source;
mod version;

pub use source::{
    ResolutionResults, VersionError, VersionResolution, VersionSource, VersionSourceAdapter,
    VersionSourceKind,
};
pub use version::{InvalidVersion, Version};
