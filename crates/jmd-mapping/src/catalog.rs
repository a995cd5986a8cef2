//! Module-name catalogs: the pre-fetched `moduleName=group:artifact` snapshot and the upstream
//! listing it is derived from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jmd_core::{Coordinate, ModuleName};
use jmd_versions::Version;
use thiserror::Error;

const EMBEDDED_SNAPSHOT: &str = include_str!("../resources/unique_modules.properties");

/// One `key=value` line of a catalog file, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCatalogEntry {
    pub module: String,
    pub value: String,
    pub line: usize,
}

impl RawCatalogEntry {
    pub fn new(module: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            value: value.into(),
            line: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{origin}:{line}: {message}")]
    Invalid {
        origin: String,
        line: usize,
        message: String,
    },
}

/// Somewhere catalog entries can be loaded from.
///
/// Loading happens once while the mapping store is built. Failures are not retried.
pub trait CatalogSource: Send + Sync {
    /// Human readable origin used in diagnostics.
    fn origin(&self) -> String;

    fn load(&self) -> Result<Vec<RawCatalogEntry>, CatalogError>;
}

/// The snapshot compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl CatalogSource for EmbeddedCatalog {
    fn origin(&self) -> String {
        "<embedded catalog>".to_string()
    }

    fn load(&self) -> Result<Vec<RawCatalogEntry>, CatalogError> {
        Ok(raw_entries(EMBEDDED_SNAPSHOT))
    }
}

/// A catalog file on disk.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileCatalog {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<RawCatalogEntry>, CatalogError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(raw_entries(&text))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Vec<RawCatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<RawCatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(module, value)| RawCatalogEntry::new(module, value))
                .collect(),
        )
    }
}

impl CatalogSource for InMemoryCatalog {
    fn origin(&self) -> String {
        "<in-memory catalog>".to_string()
    }

    fn load(&self) -> Result<Vec<RawCatalogEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}

pub fn raw_entries(text: &str) -> Vec<RawCatalogEntry> {
    jmd_properties::parse(text)
        .entries
        .into_iter()
        .map(|entry| RawCatalogEntry {
            module: entry.key,
            value: entry.value.trim_end().to_string(),
            line: entry.line,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub module: ModuleName,
    pub coordinate: Coordinate,
}

/// Validated catalog entries in source order. Duplicate module names are kept so the mapping
/// store can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn load(source: &dyn CatalogSource) -> Result<Self, CatalogError> {
        let origin = source.origin();
        let raw = source.load()?;
        let catalog = Self::from_snapshot(&origin, raw)?;
        tracing::debug!(
            target: "jmd.mapping",
            origin = %origin,
            entries = catalog.len(),
            "loaded module catalog"
        );
        Ok(catalog)
    }

    /// Validate `moduleName=group:artifact` entries.
    pub fn from_snapshot(origin: &str, raw: Vec<RawCatalogEntry>) -> Result<Self, CatalogError> {
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            let invalid = |message: String| CatalogError::Invalid {
                origin: origin.to_string(),
                line: entry.line,
                message,
            };
            let module =
                ModuleName::parse(entry.module.as_str()).map_err(|err| invalid(err.to_string()))?;
            let coordinate =
                Coordinate::parse(&entry.value).map_err(|err| invalid(err.to_string()))?;
            if coordinate.is_gav() {
                return Err(invalid(format!(
                    "catalog value `{}` for `{module}` must not carry a version",
                    entry.value
                )));
            }
            entries.push(CatalogEntry { module, coordinate });
        }
        Ok(Self { entries })
    }

    /// Derive a unique catalog from an upstream listing that maps module names to repository
    /// paths (`<repo>/<group path...>/<artifact>/<version>/<file>`).
    ///
    /// When several modules resolve to the same `group:artifact`, the one seen at the highest
    /// version wins (ties keep the first module name). The result is sorted by module name.
    pub fn from_upstream(origin: &str, raw: Vec<RawCatalogEntry>) -> Result<Self, CatalogError> {
        // Later keys override earlier ones, like a properties file.
        let mut by_module: BTreeMap<ModuleName, (Coordinate, Version)> = BTreeMap::new();
        for entry in raw {
            let invalid = |message: String| CatalogError::Invalid {
                origin: origin.to_string(),
                line: entry.line,
                message,
            };
            let module =
                ModuleName::parse(entry.module.as_str()).map_err(|err| invalid(err.to_string()))?;
            let (coordinate, version) = split_repository_path(&entry.value).map_err(invalid)?;
            by_module.insert(module, (coordinate, version));
        }

        let mut by_ga: BTreeMap<String, (ModuleName, Coordinate, Version)> = BTreeMap::new();
        for (module, (coordinate, version)) in by_module {
            match by_ga.get(&coordinate.ga_string()) {
                Some((_, _, existing)) if *existing >= version => {}
                _ => {
                    by_ga.insert(coordinate.ga_string(), (module, coordinate, version));
                }
            }
        }

        let mut entries: Vec<CatalogEntry> = by_ga
            .into_values()
            .map(|(module, coordinate, _)| CatalogEntry { module, coordinate })
            .collect();
        entries.sort_by(|a, b| a.module.cmp(&b.module));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deterministic snapshot text: one `module=group:artifact` line per entry, sorted by module
    /// name, newline-terminated.
    pub fn to_snapshot(&self) -> String {
        let mut lines: Vec<(&str, String)> = self
            .entries
            .iter()
            .map(|e| (e.module.as_str(), e.coordinate.ga_string()))
            .collect();
        lines.sort();
        lines.dedup();
        jmd_properties::write(lines.iter().map(|(k, v)| (*k, v.as_str())))
    }
}

fn split_repository_path(value: &str) -> Result<(Coordinate, Version), String> {
    let segments: Vec<&str> = value.trim().split('/').collect();
    if segments.len() < 8 {
        return Err(format!(
            "expected `<scheme>//<host>/<repo>/<group...>/<artifact>/<version>/<file>`, found `{value}`"
        ));
    }
    let len = segments.len();
    let group = segments[4..len - 3].join(".");
    let artifact = segments[len - 3].replace("-debug-jdk18on", "-jdk18on");
    let version = segments[len - 2];

    let coordinate = Coordinate::new(group, artifact).map_err(|err| err.to_string())?;
    let version = Version::parse(version).map_err(|err| err.to_string())?;
    Ok((coordinate, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upstream(module: &str, path: &str) -> RawCatalogEntry {
        RawCatalogEntry::new(module, format!("https://repo.maven.apache.org/maven2/{path}"))
    }

    #[test]
    fn embedded_catalog_is_sorted_and_valid() {
        let catalog = Catalog::load(&EmbeddedCatalog).unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog
            .entries()
            .windows(2)
            .all(|w| w[0].module < w[1].module));
        assert_eq!(catalog.to_snapshot(), EMBEDDED_SNAPSHOT);
    }

    #[test]
    fn upstream_keeps_highest_version_per_ga() {
        let raw = vec![
            upstream(
                "org.bouncycastle.provider",
                "org/bouncycastle/bcprov-jdk18on/1.78.1/bcprov-jdk18on-1.78.1.jar",
            ),
            upstream(
                "bcprov.debug",
                "org/bouncycastle/bcprov-debug-jdk18on/1.77/bcprov-debug-jdk18on-1.77.jar",
            ),
            upstream("org.slf4j", "org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.jar"),
            upstream("slf4j.api", "org/slf4j/slf4j-api/1.7.36/slf4j-api-1.7.36.jar"),
            upstream("com.google.gson", "com/google/code/gson/gson/2.10.1/gson-2.10.1.jar"),
        ];
        let catalog = Catalog::from_upstream("upstream", raw).unwrap();
        assert_eq!(
            catalog.to_snapshot(),
            "com.google.gson=com.google.code.gson:gson\n\
             org.bouncycastle.provider=org.bouncycastle:bcprov-jdk18on\n\
             org.slf4j=org.slf4j:slf4j-api\n"
        );
    }

    #[test]
    fn upstream_compares_versions_numerically() {
        let raw = vec![
            upstream("a.nine", "org/example/lib/1.9/lib-1.9.jar"),
            upstream("a.ten", "org/example/lib/1.10/lib-1.10.jar"),
        ];
        let catalog = Catalog::from_upstream("upstream", raw).unwrap();
        assert_eq!(catalog.entries()[0].module.as_str(), "a.ten");
    }

    #[test]
    fn invalid_lines_report_origin_and_line() {
        let raw = raw_entries("ok=org.slf4j:slf4j-api\nbad=no-colon\n");
        let err = Catalog::from_snapshot("mods.properties", raw).unwrap_err();
        assert!(err.to_string().starts_with("mods.properties:2: "), "{err}");

        let raw = raw_entries("pinned=org.slf4j:slf4j-api:2.0.9\n");
        assert!(Catalog::from_snapshot("mods.properties", raw).is_err());
    }

    #[test]
    fn file_catalog_failures_are_io_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let err = FileCatalog::new(tmp.path().join("missing.properties"))
            .load()
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
