//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.
//!
//! Pattern lists are validated structurally here (non-empty strings);
//! compilation happens once at worker startup, where a bad regex is
//! reported as a pattern error rather than a config error.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version_tag`, `cache_prefix`, `origin`, or `user_agent` is empty
    /// - `version_tag` does not start with `cache_prefix`
    /// - a precache asset path is not root-relative
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version_tag.is_empty() {
            return Err(ConfigError::Invalid { field: "version_tag".into(), reason: "must not be empty".into() });
        }
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }
        if !self.version_tag.starts_with(&self.cache_prefix) {
            return Err(ConfigError::Invalid {
                field: "version_tag".into(),
                reason: format!("must start with cache_prefix {:?}", self.cache_prefix),
            });
        }

        if self.origin.is_empty() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must not be empty".into() });
        }
        if self.origin.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: "must not carry a trailing slash; asset paths are appended to it".into(),
            });
        }

        for asset in &self.precache_assets {
            if !asset.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_assets".into(),
                    reason: format!("{asset:?} is not a root-relative path"),
                });
            }
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
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

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
