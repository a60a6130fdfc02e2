//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

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
    /// - `cache_ttl_hours`, `max_cache_size`, or `max_content_chars` is 0
    /// - `fetch_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` or `robots_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_hours".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_cache_size == 0 {
            return Err(ConfigError::Invalid { field: "max_cache_size".into(), reason: "must be greater than 0".into() });
        }

        if self.max_content_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "max_content_chars".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.fetch_timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "fetch_timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.fetch_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms".into(),
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

        if self.robots_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "robots_agent".into(), reason: "must not be empty".into() });
        }

        if self.failed_retention_days < 0 {
            return Err(ConfigError::Invalid {
                field: "failed_retention_days".into(),
                reason: "must not be negative".into(),
            });
        }

        if self.rate_limit_ms > 60_000 {
            tracing::warn!(
                rate_limit_ms = self.rate_limit_ms,
                "rate_limit_ms exceeds one minute; batches will be very slow"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_hours: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_hours"));
    }

    #[test]
    fn test_validate_zero_cache_size() {
        let config = AppConfig { max_cache_size: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_cache_size"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { fetch_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "fetch_timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { fetch_timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "fetch_timeout_ms"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_empty_robots_agent() {
        let config = AppConfig { robots_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "robots_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, fetch_timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
