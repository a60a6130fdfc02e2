//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (URLVAULT_*)
//! 2. TOML config file (if URLVAULT_CONFIG_FILE set)
//! 3. Built-in defaults

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
/// 1. Environment variables (URLVAULT_*)
/// 2. TOML config file (if URLVAULT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via URLVAULT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests and browser pages.
    ///
    /// Set via URLVAULT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Agent token evaluated against robots.txt rule groups.
    ///
    /// Set via URLVAULT_ROBOTS_AGENT environment variable.
    #[serde(default = "default_robots_agent")]
    pub robots_agent: String,

    /// Hours before a cache entry expires.
    ///
    /// Set via URLVAULT_CACHE_TTL_HOURS environment variable.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: i64,

    /// Hard cap on the number of cache entries; cleanup evicts the oldest
    /// entries beyond it.
    ///
    /// Set via URLVAULT_MAX_CACHE_SIZE environment variable.
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: usize,

    /// Character cap applied to extracted content before storage.
    ///
    /// Set via URLVAULT_MAX_CONTENT_CHARS environment variable.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Minimum spacing between requests to the same domain, in milliseconds.
    ///
    /// Set via URLVAULT_RATE_LIMIT_MS environment variable.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// robots.txt fetch timeout in milliseconds.
    ///
    /// Set via URLVAULT_ROBOTS_TIMEOUT_MS environment variable.
    #[serde(default = "default_robots_timeout_ms")]
    pub robots_timeout_ms: u64,

    /// Page fetch/render timeout in milliseconds.
    ///
    /// Set via URLVAULT_FETCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum bytes to fetch per response body.
    ///
    /// Set via URLVAULT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Whether the rendered (headless browser) strategy is enabled.
    ///
    /// Set via URLVAULT_RENDER_ENABLED environment variable.
    #[serde(default)]
    pub render_enabled: bool,

    /// Interval between scheduled cleanup runs, in seconds.
    ///
    /// Set via URLVAULT_CLEANUP_INTERVAL_SECS environment variable.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Days a failed entry is retained before cleanup removes it.
    ///
    /// Set via URLVAULT_FAILED_RETENTION_DAYS environment variable.
    #[serde(default = "default_failed_retention_days")]
    pub failed_retention_days: i64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./urlvault-cache.sqlite")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; urlvault/0.1)".into()
}

fn default_robots_agent() -> String {
    "urlvault".into()
}

fn default_cache_ttl_hours() -> i64 {
    24
}

fn default_max_cache_size() -> usize {
    10_000
}

fn default_max_content_chars() -> usize {
    50_000
}

fn default_rate_limit_ms() -> u64 {
    1_000
}

fn default_robots_timeout_ms() -> u64 {
    10_000
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_cleanup_interval_secs() -> u64 {
    3_600
}

fn default_failed_retention_days() -> i64 {
    7
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            robots_agent: default_robots_agent(),
            cache_ttl_hours: default_cache_ttl_hours(),
            max_cache_size: default_max_cache_size(),
            max_content_chars: default_max_content_chars(),
            rate_limit_ms: default_rate_limit_ms(),
            robots_timeout_ms: default_robots_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_bytes: default_max_bytes(),
            render_enabled: false,
            cleanup_interval_secs: default_cleanup_interval_secs(),
            failed_retention_days: default_failed_retention_days(),
        }
    }
}

impl AppConfig {
    /// Fetch timeout as a Duration for use with reqwest/tokio.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// robots.txt timeout as a Duration.
    pub fn robots_timeout(&self) -> Duration {
        Duration::from_millis(self.robots_timeout_ms)
    }

    /// Per-domain minimum spacing as a Duration.
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `URLVAULT_`
    /// 2. TOML file from `URLVAULT_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("URLVAULT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("URLVAULT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
