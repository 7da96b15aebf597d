//! Configuration loading and resolution
//!
//! Settings follow a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// TOML configuration file contents
///
/// Lives at `~/.config/catrack/config.toml` (or `/etc/catrack/config.toml`
/// system-wide on Linux). All fields optional; absent fields fall through
/// to the environment or the compiled default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Inference service base URL
    pub api_url: Option<String>,
    /// Local data folder for the evidence database
    pub data_folder: Option<String>,
    /// Extraction call deadline override, in seconds
    pub extract_timeout_secs: Option<u64>,
}

/// Resolve a string setting following the priority order above.
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
    default_value: &str,
) -> String {
    if let Some(value) = cli_arg {
        return value.to_string();
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if !value.trim().is_empty() {
            return value;
        }
    }

    if let Some(value) = toml_value {
        return value.to_string();
    }

    default_value.to_string()
}

/// Load and parse the TOML config file
///
/// Returns `Err` when no config file exists; callers treat that as
/// "all defaults" rather than a failure.
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = config_file_path()?;
    tracing::debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse config failed: {}", e)))
}

/// Get the configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("catrack").join("config.toml"));

    if let Some(path) = &user_config {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/catrack/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get the OS-dependent default data folder
///
/// Holds the evidence database and any locally saved result files.
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("catrack"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/catrack"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("catrack"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/catrack"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("catrack"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\catrack"))
    } else {
        PathBuf::from("./catrack_data")
    }
}
