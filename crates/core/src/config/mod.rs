//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CACHE_WORKER_*)
//! 2. TOML config file (if CACHE_WORKER_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! In the source design the version strings, TTL, and refresh period were
//! constants baked into the worker script; here they are an explicitly
//! constructed config object handed to the worker.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CACHE_WORKER_*)
/// 2. TOML config file (if CACHE_WORKER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Path to the SQLite store.
    ///
    /// Set via CACHE_WORKER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Cache generation version string.
    ///
    /// Names the static cache set (`static-<version>`). Bumping it forces
    /// a new generation; the previous one is deleted at activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the root-relative static asset manifest resolves against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix that classifies a request as an API request.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Time-to-live for API store entries, in milliseconds.
    ///
    /// Entries older than this are purged at read time and refetched.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Whether the background refresh scheduler runs at activation.
    #[serde(default)]
    pub refresh_enabled: bool,

    /// Refresh scheduler period, in milliseconds.
    #[serde(default = "default_refresh_period_ms")]
    pub refresh_period_ms: u64,

    /// Static asset manifest pre-populated into the static cache at install.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// User-Agent string for upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to accept per upstream response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cache-worker.sqlite")
}

fn default_cache_version() -> String {
    "v1.1".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_api_prefix() -> String {
    "/api".into()
}

fn default_ttl_ms() -> u64 {
    5 * 60 * 1000
}

fn default_refresh_period_ms() -> u64 {
    2 * 60 * 1000
}

fn default_static_assets() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/styles.css".into(), "/app.js".into()]
}

fn default_user_agent() -> String {
    "cache-worker/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            api_prefix: default_api_prefix(),
            ttl_ms: default_ttl_ms(),
            refresh_enabled: false,
            refresh_period_ms: default_refresh_period_ms(),
            static_assets: default_static_assets(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl WorkerConfig {
    /// Entry time-to-live as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Refresh period as a Duration.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_period_ms)
    }

    /// Upstream timeout as a Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the current static cache generation.
    pub fn static_cache_name(&self) -> String {
        format!("static-{}", self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CACHE_WORKER_`
    /// 2. TOML file from `CACHE_WORKER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CACHE_WORKER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CACHE_WORKER_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
