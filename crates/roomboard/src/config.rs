/// Service configuration loaded from a JSON file
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub catalog: CatalogConfig,
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

/// Where and how to reach the catalog collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// e.g. "http://catalog.internal/api"; `rooms` and `subjects` are resolved below it
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a loaded snapshot is served before refetching; 0 disables caching
    #[serde(default = "default_snapshot_ttl_secs")]
    pub snapshot_ttl_secs: u64,
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "roomboard.sqlite3".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_snapshot_ttl_secs() -> u64 {
    30
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Loads and validates the config file at `path`
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Config with defaults filled in
    /// * `Err(ConfigError)` - If the file can't be read, parsed or validated
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.catalog.base_url).map_err(|e| {
            ConfigError::Invalid(format!("catalog.base_url '{}': {}", self.catalog.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "catalog.base_url must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "catalog.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
