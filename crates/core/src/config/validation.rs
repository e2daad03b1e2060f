//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` or `user_agent` is empty
    /// - `ttl_ms` is 0
    /// - `refresh_period_ms` is under 1 second
    /// - `api_prefix` or a manifest path is not root-relative
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }

        if self.ttl_ms == 0 {
            return Err(ConfigError::Invalid { field: "ttl_ms".into(), reason: "must be greater than 0".into() });
        }

        if self.refresh_period_ms < 1000 {
            return Err(ConfigError::Invalid {
                field: "refresh_period_ms".into(),
                reason: "must be at least 1000ms".into(),
            });
        }

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "api_prefix".into(),
                reason: "must be a root-relative path".into(),
            });
        }

        if let Some(path) = self.static_assets.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "static_assets".into(),
                reason: format!("manifest path {path:?} must be root-relative"),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.refresh_enabled && self.refresh_period_ms > self.ttl_ms {
            tracing::warn!(
                refresh_period_ms = self.refresh_period_ms,
                ttl_ms = self.ttl_ms,
                "refresh period exceeds entry TTL; entries may expire between passes"
            );
        }

        Ok(())
    }
}
