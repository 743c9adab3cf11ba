//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, where the session is persisted, and
//! the last email used to sign in.
//!
//! Configuration is stored at `~/.config/gymlog/config.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::{FileStore, KeyValueStore, KeyringStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "gymlog";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured API base URL
pub const API_URL_ENV: &str = "GYMLOG_API_URL";

/// API base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";

/// Where the session records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under the data directory
    #[default]
    File,
    /// The OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// API base URL: `GYMLOG_API_URL`, then the config file, then the default
    pub fn api_base_url(&self) -> String {
        self.resolve_api_base_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_base_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Open the configured session store
    pub fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        match self.storage {
            StorageBackend::File => Ok(Arc::new(FileStore::new(self.data_dir()?)?)),
            StorageBackend::Keyring => Ok(Arc::new(KeyringStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url_precedence() {
        let mut config = Config::default();
        assert_eq!(config.resolve_api_base_url(None), DEFAULT_API_BASE_URL);

        config.api_base_url = Some("https://gym.example.com".to_string());
        assert_eq!(config.resolve_api_base_url(None), "https://gym.example.com");
        assert_eq!(
            config.resolve_api_base_url(Some("http://10.0.2.2:3333".to_string())),
            "http://10.0.2.2:3333"
        );
        assert_eq!(
            config.resolve_api_base_url(Some("  ".to_string())),
            "https://gym.example.com"
        );
    }

    #[test]
    fn test_config_parses_partial_file() {
        let config: Config = serde_json::from_str(r#"{"last_email": "a@b.com"}"#)
            .expect("Failed to parse config JSON");
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.last_email.as_deref(), Some("a@b.com"));
        assert!(config.api_base_url.is_none());

        let config: Config = serde_json::from_str(r#"{"storage": "keyring"}"#)
            .expect("Failed to parse config JSON");
        assert_eq!(config.storage, StorageBackend::Keyring);
    }
}
