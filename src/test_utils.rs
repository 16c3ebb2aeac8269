use config::{Environment, Map};
use std::path::Path;
use tempfile::TempDir;

use crate::config::Config;

pub const BASELINE_CORE_YAML: &str = include_str!("../config/core.yaml");

/// Copies the shipped `core.yaml` into a fresh directory and loads it without
/// any environment overrides.
pub fn setup_core_yaml_config() -> (TempDir, Config) {
    let tmp_dir = TempDir::new().unwrap();
    write_config_file(tmp_dir.path(), "core.yaml", BASELINE_CORE_YAML);
    let config = Config::with_environment(tmp_dir.path(), test_environment(&[])).unwrap();
    (tmp_dir, config)
}

pub fn write_config_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// The `CORE_` environment source, fed from `vars` instead of the process
/// environment.
pub fn test_environment(vars: &[(&str, &str)]) -> Environment {
    let source: Map<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    Config::environment_source().source(Some(source))
}
