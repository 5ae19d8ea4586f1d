//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (QUILL_*)
//! 2. TOML config file (if QUILL_CONFIG_FILE set)
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
/// 1. Environment variables (QUILL_*)
/// 2. TOML config file (if QUILL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store holding cache partitions and the action queue.
    ///
    /// Set via QUILL_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Version tag baked into partition names (`static-v{version}`).
    ///
    /// Bumping it makes the next activation evict every older partition.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin relative URLs are resolved against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Age after which a cached API answer is no longer served first.
    #[serde(default = "default_api_ttl_secs")]
    pub api_ttl_secs: u64,

    /// Application shell fetched on install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Background sync tag that triggers a queue replay.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    #[serde(default = "default_dynamic_max_entries")]
    pub dynamic_max_entries: usize,

    #[serde(default = "default_image_max_entries")]
    pub image_max_entries: usize,

    /// User-Agent string for outbound requests.
    ///
    /// Set via QUILL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via QUILL_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size accepted from the network.
    ///
    /// Set via QUILL_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    #[serde(default = "default_notification_badge")]
    pub notification_badge: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./quill-cache.sqlite")
}

fn default_cache_version() -> String {
    "1".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_api_ttl_secs() -> u64 {
    300
}

fn default_precache() -> Vec<String> {
    ["/", "/index.html", "/manifest.json", "/css/styles.css", "/js/app.js"].map(String::from).to_vec()
}

fn default_sync_tag() -> String {
    "sync-offline-actions".into()
}

fn default_dynamic_max_entries() -> usize {
    100
}

fn default_image_max_entries() -> usize {
    60
}

fn default_user_agent() -> String {
    "quill-worker/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_notification_icon() -> String {
    "/icons/icon-192x192.png".into()
}

fn default_notification_badge() -> String {
    "/icons/badge-72x72.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_version: default_cache_version(),
            origin: default_origin(),
            api_ttl_secs: default_api_ttl_secs(),
            precache: default_precache(),
            sync_tag: default_sync_tag(),
            dynamic_max_entries: default_dynamic_max_entries(),
            image_max_entries: default_image_max_entries(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            notification_icon: default_notification_icon(),
            notification_badge: default_notification_badge(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `QUILL_`
    /// 2. TOML file from `QUILL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("QUILL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(Env::prefixed("QUILL_").map(|key| key.as_str().to_lowercase().into()).split("__")))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./quill-cache.sqlite"));
        assert_eq!(config.cache_version, "1");
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.api_ttl_secs, 300);
        assert_eq!(config.precache.len(), 5);
        assert_eq!(config.sync_tag, "sync-offline-actions");
        assert_eq!(config.dynamic_max_entries, 100);
        assert_eq!(config.image_max_entries, 60);
        assert_eq!(config.user_agent, "quill-worker/0.1");
        assert_eq!(config.max_bytes, 10_485_760);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let toml = r#"
            cache_version = "7"
            origin = "https://journal.example"
            precache = ["/", "/offline.html"]
        "#;
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml));

        let config = AppConfig::extract(figment).unwrap();

        assert_eq!(config.cache_version, "7");
        assert_eq!(config.origin, "https://journal.example");
        assert_eq!(config.precache, vec!["/", "/offline.html"]);
        assert_eq!(config.api_ttl_secs, 300);
    }

    #[test]
    fn test_invalid_layer_fails_validation() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("api_ttl_secs = 0"));
        let result = AppConfig::extract(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_ttl_secs"));
    }

    #[test]
    fn test_malformed_layer_fails_load() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("api_ttl_secs = \"soon\""));
        assert!(matches!(AppConfig::extract(figment), Err(ConfigError::LoadFailed(_))));
    }
}
