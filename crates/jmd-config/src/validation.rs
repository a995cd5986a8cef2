use std::path::Path;

use jmd_core::{Coordinate, ModuleName};
use jmd_versions::{Version, VersionSourceKind};

use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::logging::level_directives;
use crate::JmdConfig;

/// Context for semantic config validation.
///
/// Checks that touch the filesystem (the catalog path) need the directory the config was loaded
/// from. Without it they are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidationContext<'a> {
    pub config_dir: Option<&'a Path>,
}

impl JmdConfig {
    /// Validate semantic invariants. Reports as many problems as possible in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        self.validate_with_context(ConfigValidationContext::default())
    }

    #[must_use]
    pub fn validate_with_context(&self, ctx: ConfigValidationContext<'_>) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        validate_logging(self, &mut out);
        validate_catalog(self, ctx, &mut out);
        validate_mappings(self, &mut out);
        validate_checks(self, &mut out);
        validate_versions(self, &mut out);

        out
    }
}

fn error(
    out: &mut ValidationDiagnostics,
    toml_path: impl Into<String>,
    message: impl Into<String>,
) {
    out.errors.push(ConfigValidationError::InvalidValue {
        toml_path: toml_path.into(),
        message: message.into(),
    });
}

fn check_ga(out: &mut ValidationDiagnostics, toml_path: String, value: &str) {
    match Coordinate::parse(value) {
        Ok(coordinate) if coordinate.is_gav() => {
            error(out, toml_path, format!("`{value}` must not carry a version"));
        }
        Ok(_) => {}
        Err(err) => error(out, toml_path, err.to_string()),
    }
}

fn check_version(out: &mut ValidationDiagnostics, toml_path: String, value: &str) {
    if let Err(err) = Version::parse(value) {
        error(out, toml_path, err.to_string());
    }
}

/// Module name or `group:artifact`.
fn check_key(out: &mut ValidationDiagnostics, toml_path: String, key: &str) {
    if key.contains(':') {
        check_ga(out, toml_path, key);
    } else if let Err(err) = ModuleName::parse(key) {
        error(out, toml_path, err.to_string());
    }
}

fn validate_logging(config: &JmdConfig, out: &mut ValidationDiagnostics) {
    let normalized = level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}

fn validate_catalog(
    config: &JmdConfig,
    ctx: ConfigValidationContext<'_>,
    out: &mut ValidationDiagnostics,
) {
    let Some(path) = &config.catalog.path else {
        return;
    };
    if let Some(config_dir) = ctx.config_dir {
        let resolved = config_dir.join(path);
        if !resolved.is_file() {
            out.warnings.push(ConfigWarning::CatalogPathMissing {
                toml_path: "catalog.path".to_string(),
                resolved,
            });
        }
    }
    if !config.catalog.embedded {
        out.warnings.push(ConfigWarning::Ineffective {
            toml_path: "catalog.embedded".to_string(),
            message: "ignored because `catalog.path` is set".to_string(),
        });
    }
}

fn validate_mappings(config: &JmdConfig, out: &mut ValidationDiagnostics) {
    for (module, coordinate) in &config.mappings {
        let toml_path = format!("mappings.\"{module}\"");
        if let Err(err) = ModuleName::parse(module.as_str()) {
            error(out, toml_path.clone(), err.to_string());
        }
        check_ga(out, toml_path, coordinate);
    }

    for (prefix, group) in &config.prefix_groups {
        let toml_path = format!("prefix_groups.\"{prefix}\"");
        if !prefix.ends_with('.') {
            error(out, toml_path.clone(), "prefix must end with `.`");
        }
        if group.trim().is_empty() || group.contains(':') {
            error(out, toml_path, format!("`{group}` is not a group id"));
        }
    }
}

fn validate_checks(config: &JmdConfig, out: &mut ValidationDiagnostics) {
    for (idx, ga) in config.checks.runtime_exceptions.iter().enumerate() {
        check_ga(out, format!("checks.runtime_exceptions[{idx}]"), ga);
    }
}

fn validate_versions(config: &JmdConfig, out: &mut ValidationDiagnostics) {
    let versions = &config.versions;

    for (key, version) in &versions.pins {
        let toml_path = format!("versions.pins.\"{key}\"");
        check_key(out, toml_path.clone(), key);
        check_version(out, toml_path, version);
    }

    let sources = versions.effective_sources();
    if sources.contains(&VersionSourceKind::None) && sources.len() > 1 {
        error(
            out,
            "versions.sources",
            "`none` cannot be combined with other sources",
        );
    }

    match &versions.consistent_resolution {
        Some(cr) => {
            if cr.reference.trim().is_empty() {
                error(
                    out,
                    "versions.consistent_resolution.reference",
                    "must name a configuration",
                );
            }
            for (idx, ga) in cr.excepted.iter().enumerate() {
                check_ga(out, format!("versions.consistent_resolution.excepted[{idx}]"), ga);
            }
            if !sources.contains(&VersionSourceKind::ConsistentResolution) {
                out.warnings.push(ConfigWarning::Ineffective {
                    toml_path: "versions.consistent_resolution".to_string(),
                    message: "`consistent_resolution` is not listed in `versions.sources`".to_string(),
                });
            }
        }
        None if sources.contains(&VersionSourceKind::ConsistentResolution) => error(
            out,
            "versions.sources",
            "`consistent_resolution` is listed but [versions.consistent_resolution] is missing",
        ),
        None => {}
    }

    match &versions.platform {
        Some(platform) => {
            check_ga(out, "versions.platform.coordinate".to_string(), &platform.coordinate);
            for (key, version) in &platform.versions {
                let toml_path = format!("versions.platform.versions.\"{key}\"");
                check_key(out, toml_path.clone(), key);
                check_version(out, toml_path, version);
            }
            if !sources.contains(&VersionSourceKind::Platform) {
                out.warnings.push(ConfigWarning::Ineffective {
                    toml_path: "versions.platform".to_string(),
                    message: "`platform` is not listed in `versions.sources`".to_string(),
                });
            }
        }
        None if sources.contains(&VersionSourceKind::Platform) => error(
            out,
            "versions.sources",
            "`platform` is listed but [versions.platform] is missing",
        ),
        None => {}
    }
}
