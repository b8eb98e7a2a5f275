//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the catalog endpoint and key, the identity list location
//! and the last used username.
//!
//! Configuration is stored at `~/.config/moviedeck/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_API_BASE_URL;
use crate::api::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::notify::DEFAULT_NOTIFICATION_DURATION;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "moviedeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Identity list file name, looked up in the config directory by default
const USERS_FILE: &str = "users.json";

pub const ENV_API_KEY: &str = "MOVIEDECK_API_KEY";
pub const ENV_API_URL: &str = "MOVIEDECK_API_URL";
pub const ENV_USERS_FILE: &str = "MOVIEDECK_USERS_FILE";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_notification_duration_ms() -> u64 {
    DEFAULT_NOTIFICATION_DURATION.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub users_file: Option<PathBuf>,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            users_file: None,
            last_username: None,
            notification_duration_ms: default_notification_duration_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from `MOVIEDECK_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(path) = lookup(ENV_USERS_FILE) {
            self.users_file = Some(PathBuf::from(path));
        }
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Identity list location: configured path, else `users.json` next to
    /// the config file.
    pub fn users_path(&self) -> Result<PathBuf> {
        match self.users_file {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join(USERS_FILE)),
        }
    }

    /// Directory holding durable session storage and log files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
