//! Application configuration.
//!
//! Loaded from a TOML file whose path comes from `--config` or the
//! `APP_CONF_FILE` environment variable.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientConfig;
use crate::registry::RegistryConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
    /// JSON when stdout is not a terminal.
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    /// Host the diagnostics endpoint binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port of the diagnostics endpoint.
    pub profile_port: u16,
    /// Grace period between a termination signal and a forced exit.
    #[serde(default = "default_fail_fast_timeout_secs")]
    pub fail_fast_timeout_secs: u64,
    /// How many times the demo calls are repeated.
    #[serde(default = "default_demo_rounds")]
    pub demo_rounds: usize,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_fail_fast_timeout_secs() -> u64 {
    3
}

fn default_demo_rounds() -> usize {
    1
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("app_name must not be empty".to_string()));
        }
        if self.fail_fast_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fail_fast_timeout_secs must be greater than zero".to_string(),
            ));
        }
        for entry in &self.registry.services {
            if entry.name.is_empty() {
                return Err(ConfigError::Invalid("registry service without a name".to_string()));
            }
        }
        self.profile_addr()?;
        Ok(())
    }

    pub fn profile_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.profile_port)
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "invalid profile address {}:{}",
                    self.host, self.profile_port
                ))
            })
    }

    pub fn fail_fast_timeout(&self) -> Duration {
        Duration::from_secs(self.fail_fast_timeout_secs)
    }
}
