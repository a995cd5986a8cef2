use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::parse::{parse_module_info, ModuleInfoParseError, ParsedModuleInfo};

pub const MODULE_INFO_FILE: &str = "module-info.java";

#[derive(Debug, Error)]
pub enum ReadError {
    /// None of the source roots contains a `module-info.java`. Callers skip the unit.
    #[error("no module-info.java found in {} source root(s)", .roots.len())]
    MissingModuleInfo { roots: Vec<PathBuf> },
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ModuleInfoParseError,
    },
}

impl ReadError {
    pub fn is_missing_module_info(&self) -> bool {
        matches!(self, ReadError::MissingModuleInfo { .. })
    }
}

/// Locates and parses the `module-info.java` of a source set.
#[derive(Debug, Clone, Default)]
pub struct ModuleInfoReader {
    source_roots: Vec<PathBuf>,
}

impl ModuleInfoReader {
    pub fn new(source_roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            source_roots: source_roots.into_iter().map(Into::into).collect(),
        }
    }

    /// The first source root containing a `module-info.java`, if any.
    pub fn locate(&self) -> Option<PathBuf> {
        self.source_roots
            .iter()
            .map(|root| root.join(MODULE_INFO_FILE))
            .find(|candidate| candidate.is_file())
    }

    pub fn read(&self) -> Result<(PathBuf, ParsedModuleInfo), ReadError> {
        let Some(path) = self.locate() else {
            tracing::debug!(
                target: "jmd.modules",
                roots = self.source_roots.len(),
                "no module-info.java in source roots"
            );
            return Err(ReadError::MissingModuleInfo {
                roots: self.source_roots.clone(),
            });
        };

        let parsed = read_file(&path)?;
        tracing::debug!(
            target: "jmd.modules",
            path = %path.display(),
            module = %parsed.declaration.name,
            requires = parsed.declaration.requires.len(),
            errors = parsed.errors.len(),
            "read module declaration"
        );
        Ok((path, parsed))
    }
}

/// Read and parse a single `module-info.java`.
pub fn read_file(path: &Path) -> Result<ParsedModuleInfo, ReadError> {
    let text = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_module_info(&text).map_err(|source| ReadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
