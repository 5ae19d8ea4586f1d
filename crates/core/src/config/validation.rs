//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.is_empty()
            || !self.cache_version.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(invalid("cache_version", "must be non-empty and use only [A-Za-z0-9._-]"));
        }

        if !is_http_url(&self.origin) {
            return Err(invalid("origin", "must be an absolute http(s) URL"));
        }

        if self.api_ttl_secs == 0 || self.api_ttl_secs > 86_400 {
            return Err(invalid("api_ttl_secs", "must be between 1 and 86400"));
        }

        if let Some(bad) = self.precache.iter().find(|p| !p.starts_with('/') && !is_http_url(p)) {
            return Err(invalid("precache", format!("{bad:?} is neither a path nor an http(s) URL")));
        }

        if self.sync_tag.trim().is_empty() {
            return Err(invalid("sync_tag", "must not be empty"));
        }

        if self.dynamic_max_entries == 0 {
            return Err(invalid("dynamic_max_entries", "must be greater than 0"));
        }
        if self.image_max_entries == 0 {
            return Err(invalid("image_max_entries", "must be greater than 0"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.precache.is_empty() {
            tracing::warn!("precache list is empty; the app shell will not be available offline");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(config: AppConfig) -> String {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_cache_version_charset() {
        assert_eq!(field_of(AppConfig { cache_version: "v 2".into(), ..Default::default() }), "cache_version");
        assert_eq!(field_of(AppConfig { cache_version: String::new(), ..Default::default() }), "cache_version");
        assert!(AppConfig { cache_version: "2026.03_a-1".into(), ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_validate_origin() {
        assert_eq!(field_of(AppConfig { origin: "ftp://journal.test".into(), ..Default::default() }), "origin");
        assert_eq!(field_of(AppConfig { origin: "/relative".into(), ..Default::default() }), "origin");
    }

    #[test]
    fn test_validate_api_ttl_bounds() {
        assert_eq!(field_of(AppConfig { api_ttl_secs: 0, ..Default::default() }), "api_ttl_secs");
        assert_eq!(field_of(AppConfig { api_ttl_secs: 86_401, ..Default::default() }), "api_ttl_secs");
        assert!(AppConfig { api_ttl_secs: 86_400, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_validate_precache_entries() {
        let config = AppConfig { precache: vec!["/".into(), "styles.css".into()], ..Default::default() };
        assert_eq!(field_of(config), "precache");

        let config =
            AppConfig { precache: vec!["/".into(), "https://cdn.example/font.woff2".into()], ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_sync_tag() {
        assert_eq!(field_of(AppConfig { sync_tag: "  ".into(), ..Default::default() }), "sync_tag");
    }

    #[test]
    fn test_validate_lru_bounds() {
        assert_eq!(field_of(AppConfig { dynamic_max_entries: 0, ..Default::default() }), "dynamic_max_entries");
        assert_eq!(field_of(AppConfig { image_max_entries: 0, ..Default::default() }), "image_max_entries");
    }

    #[test]
    fn test_validate_max_bytes() {
        assert_eq!(field_of(AppConfig { max_bytes: 0, ..Default::default() }), "max_bytes");
        assert_eq!(field_of(AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }), "max_bytes");
    }

    #[test]
    fn test_validate_timeout() {
        assert_eq!(field_of(AppConfig { timeout_ms: 50, ..Default::default() }), "timeout_ms");
        assert_eq!(field_of(AppConfig { timeout_ms: 301_000, ..Default::default() }), "timeout_ms");
    }

    #[test]
    fn test_validate_empty_user_agent() {
        assert_eq!(field_of(AppConfig { user_agent: String::new(), ..Default::default() }), "user_agent");
    }

    #[test]
    fn test_validate_max_values() {
        let config = AppConfig { max_bytes: 50 * 1024 * 1024, timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
