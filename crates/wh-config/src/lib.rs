//! Warehouse Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub audit: AuditConfig,
}

/// MongoDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "inventory_db".to_string(),
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Collection holding every wrapped audit document
    pub collection: String,
    /// Page size used when the caller does not pick one
    pub default_page_size: u32,
    /// Upper bound on any requested page size
    pub max_page_size: u32,
    /// Lookback used by the dashboard activity counts
    pub default_activity_window_days: u32,
    pub max_activity_window_days: u32,
    /// Create secondary indexes on startup
    pub ensure_indexes: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            collection: "warehouse-audit-logs".to_string(),
            default_page_size: 50,
            max_page_size: 100,
            default_activity_window_days: 7,
            max_activity_window_days: 365,
            ensure_indexes: true,
        }
    }
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "audit.collection must not be empty".to_string(),
            ));
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "audit.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::ValidationError(format!(
                "audit.default_page_size must be between 1 and {}",
                self.max_page_size
            )));
        }
        if self.default_activity_window_days == 0
            || self.default_activity_window_days > self.max_activity_window_days
        {
            return Err(ConfigError::ValidationError(format!(
                "audit.default_activity_window_days must be between 1 and {}",
                self.max_activity_window_days
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mongodb.uri.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "mongodb.uri must not be empty".to_string(),
            ));
        }
        if self.mongodb.database.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "mongodb.database must not be empty".to_string(),
            ));
        }
        self.audit.validate()
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Warehouse Configuration
# Environment variables (WAREHOUSE_*) override these settings

[mongodb]
uri = "mongodb://localhost:27017"
database = "inventory_db"

[audit]
collection = "warehouse-audit-logs"
default_page_size = 50
max_page_size = 100
default_activity_window_days = 7
max_activity_window_days = 365
ensure_indexes = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audit.collection, "warehouse-audit-logs");
        assert_eq!(config.audit.max_page_size, 100);
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.mongodb.database, "inventory_db");
        assert_eq!(config.audit.default_page_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_toml_matches_defaults() {
        let example: toml::Table = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults: toml::Table =
            toml::from_str(&toml::to_string(&AppConfig::default()).unwrap()).unwrap();
        assert_eq!(example, defaults);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[audit]\nmax_page_size = 20\ndefault_page_size = 10").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.audit.max_page_size, 20);
        assert_eq!(config.audit.default_page_size, 10);
        assert_eq!(config.audit.collection, "warehouse-audit-logs");
        assert_eq!(config.mongodb.uri, "mongodb://localhost:27017");
    }

    #[test]
    fn test_default_page_size_above_max_is_rejected() {
        let mut config = AppConfig::default();
        config.audit.default_page_size = 200;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_activity_window_is_rejected() {
        let mut config = AppConfig::default();
        config.audit.default_activity_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[audit\nmax_page_size = ").unwrap();
        assert!(matches!(AppConfig::from_file(file.path()), Err(ConfigError::ParseError(_))));
    }
}
