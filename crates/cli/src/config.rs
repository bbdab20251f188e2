//! `trace.toml` configuration.
//!
//! Every section is optional. Command-line flags and environment variables
//! take precedence over file values.
//!
//! # Example
//!
//! ```toml
//! [ledger]
//! path = "/var/lib/trace/ledger.json"
//!
//! [serve]
//! port = 8080
//! api_key = "change-me"
//!
//! [log]
//! filter = "info,trace_ledger=debug"
//! json = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Config file read from the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "trace.toml";

/// Environment variable overriding `[serve] api_key`.
pub(crate) const API_KEY_ENV: &str = "TRACE_API_KEY";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TraceConfig {
    pub(crate) ledger: LedgerConfig,
    pub(crate) serve: ServeConfig,
    pub(crate) log: LogConfig,
}

/// `[ledger]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LedgerConfig {
    /// JSON file holding the world state.
    pub(crate) path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("trace-ledger.json"),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ServeConfig {
    pub(crate) port: u16,
    /// Required on every route but `/health` when set.
    pub(crate) api_key: Option<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            api_key: None,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub(crate) filter: Option<String>,
    pub(crate) json: bool,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Parse a config file.
pub(crate) fn read_config(path: &Path) -> Result<TraceConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. Without one, `trace.toml` in the working
/// directory is used if present, otherwise the defaults.
pub(crate) fn load(explicit: Option<&Path>) -> Result<TraceConfig, String> {
    let mut config = match explicit {
        Some(path) => read_config(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.is_file() {
                read_config(default_path)?
            } else {
                TraceConfig::default()
            }
        }
    };
    apply_env(&mut config, std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

fn apply_env(config: &mut TraceConfig, api_key: Option<String>) {
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        config.serve.api_key = Some(key);
    }
}
