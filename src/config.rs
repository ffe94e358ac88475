// Copyright 2024-2026 k3d-provider Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider process configuration.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file named by
//! `K3D_PROVIDER_CONFIG`, then individual `K3D_PROVIDER_*` variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const ENV_CONFIG_FILE: &str = "K3D_PROVIDER_CONFIG";
pub const ENV_BACKEND: &str = "K3D_PROVIDER_BACKEND";
pub const ENV_K3D_BINARY: &str = "K3D_PROVIDER_K3D_BINARY";
pub const ENV_CONFIG_DIR: &str = "K3D_PROVIDER_CONFIG_DIR";
pub const ENV_KUBECONFIG: &str = "K3D_PROVIDER_KUBECONFIG";
pub const ENV_CREATE_TIMEOUT: &str = "K3D_PROVIDER_CREATE_TIMEOUT_SECS";
pub const ENV_LOG_FORMAT: &str = "K3D_PROVIDER_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "K3D_PROVIDER_LOG_LEVEL";

/// Seconds k3d waits for a new cluster to become ready.
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 90;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which `K3dClient` implementation serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The k3d command line tool.
    #[default]
    Cli,
    /// In-process simulation; no containers are created.
    Memory,
}

impl FromStr for BackendKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(BackendKind::Cli),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `k3d_provider=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub backend: BackendKind,
    /// k3d executable, looked up on `PATH` when relative.
    pub k3d_binary: PathBuf,
    /// Directory for standalone kubeconfigs; `~/.config/k3d` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    /// Default kubeconfig; `$KUBECONFIG` or `~/.kube/config` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig_path: Option<PathBuf>,
    pub create_timeout_secs: u64,
    /// Wait for cluster readiness on create.
    pub wait: bool,
    pub log: LogConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Cli,
            k3d_binary: PathBuf::from("k3d"),
            config_dir: None,
            kubeconfig_path: None,
            create_timeout_secs: DEFAULT_CREATE_TIMEOUT_SECS,
            wait: true,
            log: LogConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `env` to look up variables.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match env(ENV_CONFIG_FILE).filter(|p| !p.is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = var(ENV_BACKEND) {
            self.backend = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BACKEND,
                value,
            })?;
        }
        if let Some(value) = var(ENV_K3D_BINARY) {
            self.k3d_binary = PathBuf::from(value);
        }
        if let Some(value) = var(ENV_CONFIG_DIR) {
            self.config_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = var(ENV_KUBECONFIG) {
            self.kubeconfig_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var(ENV_CREATE_TIMEOUT) {
            self.create_timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_CREATE_TIMEOUT,
                    value,
                })?;
        }
        if let Some(value) = var(ENV_LOG_FORMAT) {
            self.log.format = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_LOG_FORMAT,
                value,
            })?;
        }
        if let Some(value) = var(ENV_LOG_LEVEL) {
            self.log.level = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k3d_binary.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("k3d_binary must not be empty".into()));
        }
        if self.create_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "create_timeout_secs must be greater than zero".into(),
            ));
        }
        if EnvFilter::try_new(&self.log.level).is_err() {
            return Err(ConfigError::Invalid(format!(
                "log level '{}' is not a valid filter",
                self.log.level
            )));
        }
        Ok(())
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    /// Directory holding `kubeconfig-<name>.yaml` files.
    pub fn config_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.config_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".config")
                .join("k3d")),
        }
    }

    /// Like [`Self::config_dir`], creating the directory if missing.
    pub fn resolve_config_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.config_dir()?;
        std::fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
