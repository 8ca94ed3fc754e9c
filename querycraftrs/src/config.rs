//! Configuration system for querycraft.
//!
//! Supports TOML-based configuration for the composer and caller defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::Vendor;
use crate::error::{QuerycraftError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerycraftConfig {
    pub compose: ComposeConfig,
    pub defaults: DefaultsConfig,
}

/// Query composition settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Maximum number of queries in one rollup chain (0 = unlimited).
    pub max_chain_length: usize,
    /// Emit every composed statement at trace level.
    pub log_sql: bool,
}

/// Defaults for callers that do not name a vendor themselves.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub vendor: Option<String>,
}

impl QuerycraftConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| QuerycraftError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| QuerycraftError::Config(format!("failed to parse config: {e}")))
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `QUERYCRAFT_CONFIG` environment variable
    /// 2. `./querycraft.toml` (current directory)
    /// 3. `~/.config/querycraft/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("QUERYCRAFT_CONFIG") {
            if let Ok(cfg) = Self::from_file(&path) {
                tracing::info!(path = %path, "loaded config from QUERYCRAFT_CONFIG");
                return cfg;
            }
        }

        if let Ok(cfg) = Self::from_file("querycraft.toml") {
            tracing::info!("loaded config from ./querycraft.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("querycraft").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    /// The configured default vendor, validated against the supported set.
    pub fn default_vendor(&self) -> Result<Option<Vendor>> {
        self.defaults
            .vendor
            .as_deref()
            .map(str::parse::<Vendor>)
            .transpose()
    }
}
