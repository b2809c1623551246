//! Configuration loading for hugd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//!
//! When no file exists the built-in defaults are used.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::proxy::validate_timing;
use crate::{DeadlinePolicy, HuginnError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Client listener (default: 0.0.0.0:8080).
    #[serde(default = "default_address")]
    pub address: String,
    /// Admin listener (default: 0.0.0.0:8081).
    #[serde(default = "default_control_address")]
    pub control_address: String,
    /// Raise the default log level to `debug`.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            control_address: default_control_address(),
            debug: false,
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_control_address() -> String {
    "0.0.0.0:8081".to_string()
}

/// Upstream endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    /// Transport timeout for a single fetch, in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub transform: TransformKind,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_timeout(),
            transform: TransformKind::default(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_upstream_url() -> String {
    "https://places.aviasales.ru/v2/places.json".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Which payload transform the daemon applies to upstream answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    #[default]
    Places,
    Identity,
}

/// Freshness and deadline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entry age after which it is stale (default: 86400, minimum 60).
    #[serde(default = "default_expiry_period")]
    pub expiry_period_secs: u64,
    /// Per-request deadline in milliseconds (default: 3000, minimum 1).
    #[serde(default = "default_sla")]
    pub sla_ms: u64,
    #[serde(default)]
    pub deadline_policy: DeadlinePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry_period_secs: default_expiry_period(),
            sla_ms: default_sla(),
            deadline_policy: DeadlinePolicy::default(),
        }
    }
}

impl CacheConfig {
    pub fn expiry_period(&self) -> Duration {
        Duration::from_secs(self.expiry_period_secs)
    }

    pub fn sla(&self) -> Duration {
        Duration::from_millis(self.sla_ms)
    }
}

fn default_expiry_period() -> u64 {
    24 * 60 * 60
}

fn default_sla() -> u64 {
    3000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `memory` or a `postgres://` connection string (default: memory).
    #[serde(default = "default_dsn")]
    pub dsn: String,
    /// Interval between liveness probes of the database (default: 1000).
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dsn: default_dsn(),
            liveness_interval_ms: default_liveness_interval(),
        }
    }
}

impl StorageConfig {
    pub fn is_memory(&self) -> bool {
        self.dsn == "memory"
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }
}

fn default_dsn() -> String {
    "memory".to_string()
}

fn default_liveness_interval() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.huginn/config.toml`
    /// 3. `/etc/huginn/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Reject values below the accepted minimums.
    pub fn validate(&self) -> Result<()> {
        validate_timing(self.cache.sla(), self.cache.expiry_period())?;
        if self.upstream.url.is_empty() {
            return Err(HuginnError::Configuration("upstream url is empty".into()));
        }
        if !self.storage.is_memory() && !self.storage.dsn.starts_with("postgres") {
            return Err(HuginnError::Configuration(
                "unsupported storage dsn, expected `memory` or postgres://...".into(),
            ));
        }
        Ok(())
    }
}
