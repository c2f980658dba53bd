//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "warehouse.toml",
    "./config/config.toml",
    "./config/warehouse.toml",
    "/etc/warehouse/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found), apply environment overrides, validate
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("WAREHOUSE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{key} has an invalid value: {value}")))
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // MongoDB
    if let Some(val) = lookup("WAREHOUSE_MONGODB_URI") {
        config.mongodb.uri = val;
    }
    if let Some(val) = lookup("WAREHOUSE_MONGODB_DATABASE") {
        config.mongodb.database = val;
    }

    // Audit
    if let Some(val) = lookup("WAREHOUSE_AUDIT_COLLECTION") {
        config.audit.collection = val;
    }
    if let Some(val) = lookup("WAREHOUSE_AUDIT_DEFAULT_PAGE_SIZE") {
        config.audit.default_page_size = parse_var("WAREHOUSE_AUDIT_DEFAULT_PAGE_SIZE", &val)?;
    }
    if let Some(val) = lookup("WAREHOUSE_AUDIT_MAX_PAGE_SIZE") {
        config.audit.max_page_size = parse_var("WAREHOUSE_AUDIT_MAX_PAGE_SIZE", &val)?;
    }
    if let Some(val) = lookup("WAREHOUSE_AUDIT_ACTIVITY_WINDOW_DAYS") {
        config.audit.default_activity_window_days =
            parse_var("WAREHOUSE_AUDIT_ACTIVITY_WINDOW_DAYS", &val)?;
    }
    if let Some(val) = lookup("WAREHOUSE_AUDIT_ENSURE_INDEXES") {
        config.audit.ensure_indexes = parse_var("WAREHOUSE_AUDIT_ENSURE_INDEXES", &val)?;
    }

    Ok(())
}
