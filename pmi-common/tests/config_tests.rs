//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests:
//! - Missing TOML files do not cause failure (warning + defaults)
//! - Malformed TOML files are reported as configuration errors
//! - Priority order: CLI argument > PMI_CONFIG > platform locations
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate PMI_CONFIG are marked with #[serial].

use pmi_common::config::{
    load_toml, parse_toml, resolve_config_path, LoggingConfig, CONFIG_ENV_VAR,
};
use pmi_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, PartialEq)]
struct SampleConfig {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    iterations: Option<u32>,
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config: SampleConfig = load_toml(Some(&missing)).unwrap();
    assert_eq!(config, SampleConfig::default());
}

#[test]
fn test_valid_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "iterations = 2500").unwrap();
    writeln!(file, "[logging]").unwrap();
    writeln!(file, "level = \"debug\"").unwrap();

    let config: SampleConfig = load_toml(Some(file.path())).unwrap();
    assert_eq!(config.iterations, Some(2500));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_malformed_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "iterations = [not toml").unwrap();

    let result: Result<SampleConfig, Error> = load_toml(Some(file.path()));
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Failed to parse TOML")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_parse_toml_wrong_type() {
    let result: Result<SampleConfig, Error> = parse_toml("iterations = \"many\"");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    let test_path = "/tmp/pmi-test-env-config.toml";
    env::set_var(CONFIG_ENV_VAR, test_path);

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from(test_path)));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/pmi-priority-2.toml");

    let cli = PathBuf::from("/tmp/pmi-priority-1.toml");
    let resolved = resolve_config_path(Some(&cli), CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(cli));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_ne!(resolved, Some(PathBuf::from("   ")));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}
