//! Configuration file resolution and loading
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PMI_CONFIG`)
//! 3. Platform config directory (`<config_dir>/pmi-engine/config.toml`,
//!    then `/etc/pmi-engine/config.toml` on Linux)
//! 4. Compiled defaults (no file)
//!
//! A missing file is not an error: the loader logs a warning and falls back
//! to compiled defaults. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PMI_CONFIG";

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "pmi-engine";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which config file to read, if any
///
/// Explicit paths (CLI, environment) are returned even when the file does
/// not exist so the loader can report the fallback. Platform locations are
/// only returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config locations
    platform_config_file()
}

fn platform_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML document into a config type
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

/// Load a config type from an optional path
///
/// `None` or a missing file yields `T::default()` with a warning.
pub fn load_toml<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        info!("No configuration file found, using compiled defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Configuration file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_toml(&content).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "info");
        assert!(logging.file.is_none());
    }

    #[test]
    fn test_logging_partial_toml() {
        let logging: LoggingConfig = parse_toml("file = \"/tmp/pmi.log\"").unwrap();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.file, Some(PathBuf::from("/tmp/pmi.log")));
    }

    #[test]
    fn test_cli_path_wins() {
        let cli = PathBuf::from("/tmp/explicit.toml");
        let resolved = resolve_config_path(Some(&cli), "PMI_CONFIG_UNIT_TEST_UNSET");
        assert_eq!(resolved, Some(cli));
    }

    #[test]
    fn test_load_none_uses_defaults() {
        let logging: LoggingConfig = load_toml(None).unwrap();
        assert_eq!(logging, LoggingConfig::default());
    }
}
