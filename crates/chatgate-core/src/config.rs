//! Application configuration management.
//!
//! Holds the service base address, the request ceiling, the guard's login and
//! landing paths, and the route table.
//!
//! Configuration is stored at `~/.config/chatgate/config.json`. The
//! `CHATGATE_API_URL` environment variable overrides the base address.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::router::{
    Requirement, RouteDescriptor, RouteRegistry, DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH,
};

/// Application name used for the config directory path
const APP_NAME: &str = "chatgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "CHATGATE_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:3000";

const DEFAULT_TIMEOUT_SECS: u64 = 5;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_landing_path() -> String {
    DEFAULT_LANDING_PATH.to_string()
}

/// Route table of the chat client
pub fn default_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/", Requirement::Public),
        RouteDescriptor::new("/login", Requirement::RequiresGuest),
        RouteDescriptor::new("/chats", Requirement::RequiresAuth),
        RouteDescriptor::new("/chats/:id", Requirement::RequiresAuth),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            routes: default_routes(),
        }
    }
}

impl Config {
    /// Load from the user config directory, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(e) => {
                debug!(error = %e, "No config directory, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.timeout_secs > 0, "timeout_secs must be at least 1");
        Ok(())
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

    fn apply_env(&mut self) {
        self.override_api_url(std::env::var(API_URL_ENV).ok());
    }

    fn override_api_url(&mut self, url: Option<String>) {
        if let Some(url) = url {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the route registry described by this config
    pub fn registry(&self) -> Result<RouteRegistry> {
        RouteRegistry::new(self.routes.clone()).context("Invalid route table in config")
    }
}
