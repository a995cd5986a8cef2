//! `jmd.toml`: user mappings, version sources, checks and logging.
//!
//! The config is plain data. [`JmdConfig::mapping_store`], [`JmdConfig::version_adapter`] and
//! the `*_options` accessors turn it into the engine's inputs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use jmd_core::{Coordinate, ModuleName};
use jmd_deps::{SynthesisOptions, ValidationOptions};
use jmd_mapping::{
    Catalog, CatalogError, CatalogSource, EmbeddedCatalog, FileCatalog, LocalModule, MappingStore,
    PrefixGroupRule,
};
use jmd_versions::{Version, VersionSource, VersionSourceAdapter, VersionSourceKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod diagnostics;
mod logging;
mod validation;

pub use diagnostics::{
    ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics,
};
pub use logging::{init_tracing, LoggingConfig};
pub use validation::ConfigValidationContext;

/// Environment variable that points at the config file, absolute or relative to the working
/// directory.
pub const JMD_CONFIG_ENV_VAR: &str = "JMD_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JmdConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Explicit module name to `group:artifact` mappings. They override everything else.
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
    /// Module name prefix (ending in `.`) to group. The rest of the name becomes the artifact.
    #[serde(default)]
    pub prefix_groups: BTreeMap<String, String>,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub versions: VersionsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFormat {
    /// `module=group:artifact` lines.
    #[default]
    Snapshot,
    /// `module=<repository path>` lines, reduced to one module per GA.
    Upstream,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog file used instead of the embedded one. Relative to the config file.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: CatalogFormat,
    /// Use the embedded catalog when no `path` is set.
    #[serde(default = "default_true")]
    pub embedded: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: CatalogFormat::default(),
            embedded: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Declared dependencies without matching `requires` fail the build.
    #[serde(default)]
    pub strict_unused: bool,
    /// Directives must be listed in canonical order.
    #[serde(default)]
    pub directive_order: bool,
    #[serde(default)]
    pub warn_for_missing_versions: bool,
    /// `group:artifact` coordinates that may be declared without a `requires`.
    #[serde(default)]
    pub runtime_exceptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionsConfig {
    /// Version sources to consult. Empty means `literal`, plus every source configured below.
    #[serde(default)]
    pub sources: Vec<VersionSourceKind>,
    /// Fixed versions keyed by module name or `group:artifact`.
    #[serde(default)]
    pub pins: BTreeMap<String, String>,
    #[serde(default)]
    pub consistent_resolution: Option<ConsistentResolutionConfig>,
    #[serde(default)]
    pub platform: Option<PlatformConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistentResolutionConfig {
    /// Configuration whose resolution result all other configurations follow.
    pub reference: String,
    /// `group:artifact` coordinates allowed to differ between sibling configurations.
    #[serde(default)]
    pub excepted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub coordinate: String,
    /// Constraints the platform contributes, keyed by module name or `group:artifact`.
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

impl VersionsConfig {
    /// Source kinds in effect, in listed order.
    pub fn effective_sources(&self) -> Vec<VersionSourceKind> {
        if !self.sources.is_empty() {
            return self.sources.clone();
        }
        let mut kinds = vec![VersionSourceKind::Literal];
        if self.consistent_resolution.is_some() {
            kinds.push(VersionSourceKind::ConsistentResolution);
        }
        if self.platform.is_some() {
            kinds.push(VersionSourceKind::Platform);
        }
        kinds
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config value at {toml_path}: {message}")]
    Invalid { toml_path: String, message: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` includes a source snippet; the message alone stays on one line.
        ConfigError::Toml(err.message().to_string())
    }
}

fn invalid(toml_path: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        toml_path: toml_path.into(),
        message: message.into(),
    }
}

impl JmdConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Load a config file and report unknown keys and semantic problems alongside it.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let ctx = ConfigValidationContext {
            config_dir: path.parent(),
        };
        Self::load_from_str_with_diagnostics_inner(&text, ctx)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        Self::load_from_str_with_diagnostics_inner(text, ConfigValidationContext::default())
    }

    fn load_from_str_with_diagnostics_inner(
        text: &str,
        ctx: ConfigValidationContext<'_>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<JmdConfig>(text)?;
        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.merge(config.validate_with_context(ctx));
        Ok((config, diagnostics))
    }

    /// The module catalog to seed the store with. `None` when catalogs are disabled.
    pub fn load_catalog(&self, config_dir: &Path) -> Result<Option<Catalog>, ConfigError> {
        let Some(path) = &self.catalog.path else {
            if !self.catalog.embedded {
                return Ok(None);
            }
            return Ok(Some(Catalog::load(&EmbeddedCatalog)?));
        };

        let source = FileCatalog::new(config_dir.join(path));
        let catalog = match self.catalog.format {
            CatalogFormat::Snapshot => Catalog::load(&source)?,
            CatalogFormat::Upstream => Catalog::from_upstream(&source.origin(), source.load()?)?,
        };
        Ok(Some(catalog))
    }

    /// Build the mapping store: catalog entries, the build's own modules, then `[mappings]`.
    pub fn mapping_store(
        &self,
        catalog: Option<&Catalog>,
        local_modules: &[LocalModule],
    ) -> Result<MappingStore, ConfigError> {
        let mut builder = MappingStore::builder();
        if let Some(catalog) = catalog {
            builder.add_catalog(catalog);
        }
        for local in local_modules {
            builder.add_local_module(local).map_err(|err| {
                invalid(
                    format!("local module {}", local.module),
                    err.to_string(),
                )
            })?;
        }
        for (module, coordinate) in &self.mappings {
            let toml_path = format!("mappings.\"{module}\"");
            let module = ModuleName::parse(module.as_str())
                .map_err(|err| invalid(&toml_path, err.to_string()))?;
            builder.add_user_mapping(module, parse_ga(&toml_path, coordinate)?);
        }
        for (prefix, group) in &self.prefix_groups {
            builder.add_prefix_rule(PrefixGroupRule::new(prefix.as_str(), group.as_str()));
        }
        Ok(builder.build())
    }

    /// Version sources, pins and platform constraints. Keys naming a module are mapped to their
    /// coordinate through `store`.
    pub fn version_adapter(
        &self,
        store: &MappingStore,
    ) -> Result<VersionSourceAdapter, ConfigError> {
        let versions = &self.versions;
        let mut sources = Vec::new();
        for kind in versions.effective_sources() {
            let source = match kind {
                VersionSourceKind::Literal => VersionSource::literal(),
                VersionSourceKind::None => VersionSource::none(),
                VersionSourceKind::ConsistentResolution => {
                    let cr = versions.consistent_resolution.as_ref().ok_or_else(|| {
                        invalid(
                            "versions.sources",
                            "`consistent_resolution` is listed but [versions.consistent_resolution] is missing",
                        )
                    })?;
                    VersionSource::consistent_resolution(cr.reference.as_str())
                }
                VersionSourceKind::Platform => {
                    let platform = versions.platform.as_ref().ok_or_else(|| {
                        invalid(
                            "versions.sources",
                            "`platform` is listed but [versions.platform] is missing",
                        )
                    })?;
                    VersionSource::platform(&parse_ga(
                        "versions.platform.coordinate",
                        &platform.coordinate,
                    )?)
                }
            };
            sources.push(source);
        }

        let mut adapter = VersionSourceAdapter::new(sources);
        for (key, version) in &versions.pins {
            let toml_path = format!("versions.pins.\"{key}\"");
            let ga = coordinate_for_key(&toml_path, key, store)?;
            adapter = adapter.with_pin(&ga, parse_version(&toml_path, version)?);
        }
        if let Some(cr) = &versions.consistent_resolution {
            for (idx, ga) in cr.excepted.iter().enumerate() {
                let toml_path = format!("versions.consistent_resolution.excepted[{idx}]");
                adapter = adapter.with_conflict_exception(&parse_ga(&toml_path, ga)?);
            }
        }
        if let Some(platform) = &versions.platform {
            let platform_ga = parse_ga("versions.platform.coordinate", &platform.coordinate)?;
            for (key, version) in &platform.versions {
                let toml_path = format!("versions.platform.versions.\"{key}\"");
                let ga = coordinate_for_key(&toml_path, key, store)?;
                adapter = adapter.with_platform_constraint(
                    &platform_ga,
                    &ga,
                    parse_version(&toml_path, version)?,
                );
            }
        }
        Ok(adapter)
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            warn_for_missing_versions: self.checks.warn_for_missing_versions,
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict_unused: self.checks.strict_unused,
            directive_order: self.checks.directive_order,
            own_prefix: None,
            runtime_exceptions: self
                .checks
                .runtime_exceptions
                .iter()
                .filter_map(|ga| Coordinate::parse(ga).ok())
                .map(|ga| ga.ga_string())
                .collect::<BTreeSet<_>>(),
        }
    }
}

fn parse_ga(toml_path: &str, value: &str) -> Result<Coordinate, ConfigError> {
    let coordinate = Coordinate::parse(value).map_err(|err| invalid(toml_path, err.to_string()))?;
    if coordinate.is_gav() {
        return Err(invalid(toml_path, format!("`{value}` must not carry a version")));
    }
    Ok(coordinate)
}

fn parse_version(toml_path: &str, value: &str) -> Result<Version, ConfigError> {
    Version::parse(value).map_err(|err| invalid(toml_path, err.to_string()))
}

/// `group:artifact` keys are used as is, anything else is a module name looked up in `store`.
fn coordinate_for_key(
    toml_path: &str,
    key: &str,
    store: &MappingStore,
) -> Result<Coordinate, ConfigError> {
    if key.contains(':') {
        return parse_ga(toml_path, key);
    }
    let module = ModuleName::parse(key).map_err(|err| invalid(toml_path, err.to_string()))?;
    store
        .lookup(&module)
        .cloned()
        .or_else(|| store.prefix_match(&module))
        .ok_or_else(|| invalid(toml_path, format!("no mapping is known for module `{module}`")))
}

/// Locate the config file for `root`:
///
/// 1) `JMD_CONFIG` (absolute or relative to `root`)
/// 2) `jmd.toml` in `root`
/// 3) `.jmd/config.toml` in `root`
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(JMD_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            root.join(candidate)
        };
        return Some(path);
    }

    ["jmd.toml", ".jmd/config.toml"]
        .into_iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
}

/// Load the configuration for `root` with diagnostics.
///
/// Without a config file this is [`JmdConfig::default`], `None` and empty diagnostics.
pub fn load_for_workspace_with_diagnostics(
    root: &Path,
) -> Result<(JmdConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(root) else {
        return Ok((JmdConfig::default(), None, ConfigDiagnostics::default()));
    };
    let (config, diagnostics) = JmdConfig::load_from_path_with_diagnostics(&path)?;
    Ok((config, Some(path), diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmd_mapping::InMemoryCatalog;
    use jmd_versions::VersionResolution;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
[logging]
level = "warning"

[catalog]
embedded = false

[mappings]
"org.slf4j" = "org.slf4j:slf4j-api"

[prefix_groups]
"com.example.product.module." = "com.example.product"

[checks]
strict_unused = true
runtime_exceptions = ["org.slf4j:slf4j-simple"]

[versions]
pins = { "org.slf4j" = "2.0.9" }

[versions.platform]
coordinate = "org.example:platform"
versions = { "com.example.product.module.billing" = "3.1" }
"#;

    #[test]
    fn builds_engine_inputs() {
        let (config, diagnostics) = JmdConfig::load_from_str_with_diagnostics(CONFIG).unwrap();
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(
            config.versions.effective_sources(),
            vec![VersionSourceKind::Literal, VersionSourceKind::Platform]
        );
        assert!(config.load_catalog(Path::new(".")).unwrap().is_none());

        let store = config.mapping_store(None, &[]).unwrap();
        let slf4j = ModuleName::parse("org.slf4j").unwrap();
        assert_eq!(
            store.lookup(&slf4j),
            Some(&Coordinate::parse("org.slf4j:slf4j-api").unwrap())
        );

        let adapter = config.version_adapter(&store).unwrap();
        let pinned = adapter
            .resolve_version(&Coordinate::parse("org.slf4j:slf4j-api").unwrap(), &())
            .unwrap();
        assert!(matches!(
            pinned,
            VersionResolution::Resolved { source: VersionSourceKind::Literal, .. }
        ));
        let platform = adapter
            .resolve_version(&Coordinate::parse("com.example.product:billing").unwrap(), &())
            .unwrap();
        assert_eq!(
            platform.apply(&Coordinate::parse("com.example.product:billing").unwrap()).to_string(),
            "com.example.product:billing:3.1"
        );

        let options = config.validation_options();
        assert!(options.strict_unused);
        assert!(options.runtime_exceptions.contains("org.slf4j:slf4j-simple"));
    }

    #[test]
    fn user_mappings_override_the_catalog() {
        let catalog = Catalog::load(&InMemoryCatalog::from_pairs([(
            "org.slf4j",
            "org.slf4j:slf4j-api-legacy",
        )]))
        .unwrap();
        let (config, _) = JmdConfig::load_from_str_with_diagnostics(CONFIG).unwrap();
        let store = config.mapping_store(Some(&catalog), &[]).unwrap();
        assert_eq!(
            store
                .lookup(&ModuleName::parse("org.slf4j").unwrap())
                .map(ToString::to_string),
            Some("org.slf4j:slf4j-api".to_string())
        );
    }

    #[test]
    fn pins_for_unknown_modules_are_rejected() {
        let (config, _) = JmdConfig::load_from_str_with_diagnostics(
            "[versions]\npins = { \"org.unknown\" = \"1.0\" }\n",
        )
        .unwrap();
        let store = config.mapping_store(None, &[]).unwrap();
        let err = config.version_adapter(&store).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config value at versions.pins.\"org.unknown\": no mapping is known for module `org.unknown`"
        );
    }

    #[test]
    fn listed_source_without_settings_is_an_error() {
        let (config, diagnostics) = JmdConfig::load_from_str_with_diagnostics(
            "[versions]\nsources = [\"platform\"]\n",
        )
        .unwrap();
        assert!(!diagnostics.is_ok());
        let store = config.mapping_store(None, &[]).unwrap();
        assert!(config.version_adapter(&store).is_err());
    }
}
