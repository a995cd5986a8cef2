use std::ffi::OsString;
use std::sync::Mutex;

use jmd_config::{
    discover_config_path, load_for_workspace_with_diagnostics, JmdConfig, JMD_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_jmd_toml_in_root() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(JMD_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("jmd.toml");
    std::fs::write(&config_path, "[checks]\nstrict_unused = true\n").unwrap();

    assert_eq!(discover_config_path(dir.path()), Some(config_path));
}

#[test]
fn falls_back_to_dot_jmd_directory() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(JMD_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".jmd")).unwrap();
    let config_path = dir.path().join(".jmd/config.toml");
    std::fs::write(&config_path, "").unwrap();

    assert_eq!(discover_config_path(dir.path()), Some(config_path));
}

#[test]
fn env_override_wins_over_root_file() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("jmd.toml"), "[checks]\nstrict_unused = false\n").unwrap();
    let override_path = dir.path().join("override.toml");
    std::fs::write(&override_path, "[checks]\nstrict_unused = true\n").unwrap();
    let _env = EnvVarGuard::set(JMD_CONFIG_ENV_VAR, &override_path);

    let (config, path, diagnostics) = load_for_workspace_with_diagnostics(dir.path()).unwrap();
    assert_eq!(path, Some(override_path));
    assert!(config.checks.strict_unused);
    assert!(diagnostics.is_empty());
}

#[test]
fn missing_config_is_the_default() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(JMD_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let (config, path, diagnostics) = load_for_workspace_with_diagnostics(dir.path()).unwrap();
    assert_eq!(config, JmdConfig::default());
    assert!(path.is_none());
    assert!(diagnostics.is_empty());
    assert!(config.catalog.embedded);
}

#[test]
fn relative_catalog_path_resolves_against_config_dir() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(JMD_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("modules.properties"),
        "org.slf4j=org.slf4j:slf4j-api\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("jmd.toml"),
        "[catalog]\npath = \"modules.properties\"\n",
    )
    .unwrap();

    let (config, path, diagnostics) = load_for_workspace_with_diagnostics(dir.path()).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let config_dir = path.as_deref().and_then(|p| p.parent()).unwrap();
    let catalog = config.load_catalog(config_dir).unwrap().unwrap();
    assert_eq!(catalog.len(), 1);
}
