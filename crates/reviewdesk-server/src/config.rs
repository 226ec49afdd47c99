//! Configuration file parsing for the server.
//!
//! Loads settings from a TOML file, then applies `REVIEWDESK_*` environment
//! overrides on top.

use reviewdesk_hub::HubConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "REVIEWDESK_";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// An override or field holds an unusable value
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Setting name
        key: String,
        /// Offending value
        value: String,
    },
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Fallback tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Notification hub settings
    #[serde(default)]
    pub hub: HubConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_database_path() -> String {
    "reviewdesk.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            database_path: default_database_path(),
            log_level: default_log_level(),
            hub: HubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup`, keyed by full variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("BIND_ADDRESS") {
            self.bind_address = value;
        }
        if let Some(value) = var("BIND_PORT") {
            self.bind_port = parse_override("BIND_PORT", &value)?;
        }
        if let Some(value) = var("DATABASE_PATH") {
            self.database_path = value;
        }
        if let Some(value) = var("HEARTBEAT_INTERVAL_SECS") {
            self.hub.heartbeat_interval_secs = parse_override("HEARTBEAT_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = var("CLIENT_BUFFER_SIZE") {
            self.hub.client_buffer_size = parse_override("CLIENT_BUFFER_SIZE", &value)?;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.log_level = value;
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database_path".to_string(),
                value: self.database_path.clone(),
            });
        }
        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            database_path: ":memory:".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: format!("{}{}", ENV_PREFIX, name),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 8000);
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.hub.heartbeat_interval_secs, 30);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            database_path = "/var/lib/reviewdesk/records.db"

            [hub]
            heartbeat_interval_secs = 15
            client_buffer_size = 16
        "#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.database_path, "/var/lib/reviewdesk/records.db");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.hub.heartbeat_interval_secs, 15);
        assert_eq!(config.hub.stale_after_intervals, 2);
        assert_eq!(config.hub.client_buffer_size, 16);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("REVIEWDESK_BIND_PORT", "9100"),
            ("REVIEWDESK_DATABASE_PATH", "other.db"),
            ("REVIEWDESK_HEARTBEAT_INTERVAL_SECS", "5"),
            ("REVIEWDESK_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.bind_port, 9100);
        assert_eq!(config.database_path, "other.db");
        assert_eq!(config.hub.heartbeat_interval_secs, 5);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_invalid_override() {
        let mut config = ServerConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "REVIEWDESK_BIND_PORT").then(|| "eighty".to_string())
        });

        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "REVIEWDESK_BIND_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }
}
