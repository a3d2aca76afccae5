//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CACHET_*)
//! 2. TOML config file (if CACHET_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The policy half of the configuration (version tag, precache manifest,
//! pattern lists) is effectively static per deployment: it ships with the
//! artifact and changes only on deploy. It still lives here so every
//! component receives it explicitly instead of reading globals.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CACHET_*)
/// 2. TOML config file (if CACHET_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version tag identifying the current deployed release.
    ///
    /// Drives partition naming, so old and new partitions never collide.
    /// Must start with `cache_prefix`.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Prefix identifying this application's partitions in the store.
    ///
    /// Activation only ever deletes partitions carrying this prefix.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin the hosting application is served from.
    ///
    /// Same-origin requests are eligible for cache-first handling, and
    /// precache asset paths are resolved against this origin.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Root-relative URL paths precached into the static partition at
    /// install.
    #[serde(default = "default_precache_assets")]
    pub precache_assets: Vec<String>,

    /// Patterns for third-party resources eligible for
    /// stale-while-revalidate caching.
    #[serde(default = "default_cdn_patterns")]
    pub cdn_patterns: Vec<String>,

    /// Patterns for analytics endpoints that must never be cached.
    #[serde(default = "default_analytics_patterns")]
    pub analytics_patterns: Vec<String>,

    /// Path to the SQLite cache database.
    ///
    /// Set via CACHET_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_version_tag() -> String {
    "cachet-v1.0.0".into()
}

fn default_cache_prefix() -> String {
    "cachet-".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_precache_assets() -> Vec<String> {
    ["/", "/index.html", "/manifest.json", "/icons/icon-192x192.png", "/icons/icon-512x512.png"]
        .map(String::from)
        .to_vec()
}

fn default_cdn_patterns() -> Vec<String> {
    [
        r"^https://cdn\.tailwindcss\.com/",
        r"^https://cdnjs\.cloudflare\.com/ajax/libs/font-awesome/",
        r"^https://fonts\.googleapis\.com/",
        r"^https://fonts\.gstatic\.com/",
    ]
    .map(String::from)
    .to_vec()
}

fn default_analytics_patterns() -> Vec<String> {
    [r"^https://www\.google-analytics\.com/", r"^https://www\.googletagmanager\.com/"]
        .map(String::from)
        .to_vec()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cachet-cache.sqlite")
}

fn default_user_agent() -> String {
    "cachet/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version_tag: default_version_tag(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            precache_assets: default_precache_assets(),
            cdn_patterns: default_cdn_patterns(),
            analytics_patterns: default_analytics_patterns(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Name of the static partition for the current version tag.
    pub fn static_partition(&self) -> String {
        format!("{}-static", self.version_tag)
    }

    /// Name of the runtime partition for the current version tag.
    pub fn runtime_partition(&self) -> String {
        format!("{}-runtime", self.version_tag)
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CACHET_`
    /// 2. TOML file from `CACHET_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("CACHET_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CACHET_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
