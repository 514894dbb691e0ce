//! # Configuration Module
//!
//! Configuration for the storefront core: cache store connection settings,
//! admin server binding, and logging. Configuration is loaded from a YAML
//! file with environment variable overrides, then validated before anything
//! connects. A missing cache connection URL is the one fatal startup
//! condition; everything else has a usable default.

use crate::core::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the storefront core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cache store connection settings
    pub cache: CacheSettings,

    /// Admin HTTP surface settings
    pub admin: AdminSettings,

    /// Logging settings
    pub log: LogSettings,
}

/// Cache store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Redis connection URL; required, the process refuses to start without it
    pub redis_url: String,

    /// Prefix applied to every key the store writes
    pub key_prefix: String,

    /// Bound on any single cache command round-trip; a command that exceeds
    /// it is treated the same as a store outage
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Bound on the lazy connection attempt
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

/// Admin HTTP surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Bind address for the admin router
    pub bind_address: String,

    /// Port for the admin router
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default tracing filter directive when RUST_LOG is unset
    pub level: String,

    /// Emit JSON-formatted log lines
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            admin: AdminSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: String::new(),
            command_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "storefront_cache=info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| CoreError::configuration(format!("Failed to read config file: {}", e)))?;

        let mut config: AppConfig = serde_yaml::from_str(&content)
            .map_err(|e| CoreError::configuration(format!("Failed to parse config file: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from defaults plus environment overrides
    pub fn from_env() -> CoreResult<Self> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        use std::env;

        if let Ok(url) = env::var("STOREFRONT_REDIS_URL") {
            self.cache.redis_url = url;
        }

        if let Ok(prefix) = env::var("STOREFRONT_CACHE_KEY_PREFIX") {
            self.cache.key_prefix = prefix;
        }

        if let Ok(addr) = env::var("STOREFRONT_ADMIN_BIND_ADDRESS") {
            self.admin.bind_address = addr;
        }

        if let Ok(port) = env::var("STOREFRONT_ADMIN_PORT") {
            if let Ok(port) = port.parse() {
                self.admin.port = port;
            }
        }

        if let Ok(level) = env::var("STOREFRONT_LOG_LEVEL") {
            self.log.level = level;
        }
    }

    /// Validate the configuration
    ///
    /// The cache connection URL is the only required setting. Refusing to
    /// start without it is the fatal-only startup condition; at runtime a
    /// broken connection degrades instead.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cache.redis_url.trim().is_empty() {
            return Err(CoreError::configuration(
                "cache.redis_url is required and cannot be empty",
            ));
        }

        if self.cache.command_timeout.is_zero() {
            return Err(CoreError::configuration(
                "cache.command_timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_redis_url_is_fatal() {
        let mut config = AppConfig::default();
        config.cache.redis_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_command_timeout_rejected() {
        let mut config = AppConfig::default();
        config.cache.command_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.cache.redis_url, config.cache.redis_url);
        assert_eq!(parsed.admin.port, config.admin.port);
    }
}
