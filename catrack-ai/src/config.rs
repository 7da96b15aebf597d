//! Client configuration resolution
//!
//! Service URL priority: CLI argument → `CATRACK_API_URL` → TOML config →
//! compiled default. Deadlines default to the gateway's documented
//! budgets: extraction is long-running (minutes), the health probe is a
//! quick liveness check (seconds).

use catrack_common::config::{load_toml_config, TomlConfig};
use std::time::Duration;
use tracing::warn;

/// Default gateway deployment
pub const DEFAULT_API_URL: &str = "https://lanzgaldo--catrack-provider-fastapi-app.modal.run";

/// Environment variable overriding the service URL
pub const API_URL_ENV: &str = "CATRACK_API_URL";

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Inference service base URL, no trailing slash
    pub api_url: String,
    /// Hard deadline for the extraction call
    pub extract_timeout: Duration,
    /// Hard deadline for the health probe
    pub probe_timeout: Duration,
    /// Hard deadline for synthesis and transcription calls
    pub synthesis_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            extract_timeout: Duration::from_secs(180),
            probe_timeout: Duration::from_secs(10),
            synthesis_timeout: Duration::from_secs(60),
        }
    }
}

/// Resolve the client configuration from all sources.
pub fn resolve_client_config(cli_url: Option<&str>) -> ClientConfig {
    let toml_config = load_toml_config().unwrap_or_else(|_| TomlConfig::default());
    resolve_with(cli_url, &toml_config)
}

fn resolve_with(cli_url: Option<&str>, toml_config: &TomlConfig) -> ClientConfig {
    let env_url = std::env::var(API_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty());

    let mut sources = Vec::new();
    if cli_url.is_some() {
        sources.push("command line");
    }
    if env_url.is_some() {
        sources.push("environment");
    }
    if toml_config.api_url.is_some() {
        sources.push("TOML");
    }
    if sources.len() > 1 {
        warn!(
            "Service URL found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    let api_url = cli_url
        .map(str::to_string)
        .or(env_url)
        .or_else(|| toml_config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let mut config = ClientConfig {
        api_url: api_url.trim_end_matches('/').to_string(),
        ..ClientConfig::default()
    };

    if let Some(secs) = toml_config.extract_timeout_secs {
        config.extract_timeout = Duration::from_secs(secs);
    }

    config
}
