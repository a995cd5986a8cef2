use jmd_config::{ConfigValidationError, ConfigWarning, JmdConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[checks]
strict_unsed = true

[versions.platform]
coordinate = "org.example:platform"
coordinat = "org.example:bom"
"#;

    let (_config, diagnostics) =
        JmdConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["checks.strict_unsed", "typo", "versions.platform.coordinat"]
    );
}

#[test]
fn mapping_values_must_be_coordinates_without_versions() {
    let text = r#"
[mappings]
"org.slf4j" = "org.slf4j:slf4j-api:2.0.9"
"not a module" = "org.example:thing"
"com.google.gson" = "gson"
"#;

    let (_config, diagnostics) = JmdConfig::load_from_str_with_diagnostics(text).unwrap();
    let paths: Vec<String> = diagnostics
        .errors
        .iter()
        .map(|err| match err {
            ConfigValidationError::InvalidValue { toml_path, .. } => toml_path.clone(),
            other => panic!("unexpected error {other}"),
        })
        .collect();
    assert_eq!(
        paths,
        vec![
            "mappings.\"com.google.gson\"",
            "mappings.\"not a module\"",
            "mappings.\"org.slf4j\"",
        ]
    );
}

#[test]
fn prefix_rules_must_end_with_a_dot() {
    let text = "[prefix_groups]\n\"com.example.product\" = \"com.example\"\n";
    let (_config, diagnostics) = JmdConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(diagnostics.errors.len(), 1);
    assert_eq!(
        diagnostics.errors[0].to_string(),
        "prefix_groups.\"com.example.product\": prefix must end with `.`"
    );
}

#[test]
fn unlisted_platform_is_ineffective() {
    let text = r#"
[versions]
sources = ["literal"]

[versions.platform]
coordinate = "org.example:platform"
"#;

    let (_config, diagnostics) = JmdConfig::load_from_str_with_diagnostics(text).unwrap();
    assert!(diagnostics.is_ok());
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::Ineffective {
            toml_path: "versions.platform".to_string(),
            message: "`platform` is not listed in `versions.sources`".to_string(),
        }]
    );
}

#[test]
fn bad_versions_are_reported() {
    let text = r#"
[versions]
pins = { "org.slf4j:slf4j-api" = "" }
"#;
    let (_config, diagnostics) = JmdConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(diagnostics.errors.len(), 1);
}

#[test]
fn unknown_version_source_is_a_parse_error() {
    let err = JmdConfig::load_from_str_with_diagnostics("[versions]\nsources = [\"maven\"]\n")
        .unwrap_err();
    assert!(err.to_string().starts_with("failed to parse toml config"), "{err}");
}

#[test]
fn invalid_logging_level_is_a_warning() {
    let (_config, diagnostics) =
        JmdConfig::load_from_str_with_diagnostics("[logging]\nlevel = \"warn,jmd=foo\"\n").unwrap();
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { .. }]
    ));
}

#[test]
fn missing_catalog_file_is_reported_relative_to_the_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("jmd.toml");
    std::fs::write(&config_path, "[catalog]\npath = \"missing.properties\"\n").unwrap();

    let (_config, diagnostics) = JmdConfig::load_from_path_with_diagnostics(&config_path).unwrap();
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::CatalogPathMissing {
            toml_path: "catalog.path".to_string(),
            resolved: dir.path().join("missing.properties"),
        }]
    );
}
