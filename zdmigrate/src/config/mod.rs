//! Account pair configuration
//!
//! Credentials come from a TOML file (`--config`, or the default location
//! under the user config dir) or, when no file exists, from environment
//! variables. `.env` files are honored because main loads them before
//! config resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Credentials for one Zendesk account
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub subdomain: String,
    pub email: String,
    pub token: String,
}

impl AccountConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}.zendesk.com/api/v2", self.subdomain)
    }

    fn from_env(prefix: &str) -> Result<Self> {
        let var = |suffix: &str| {
            let name = format!("{}_{}", prefix, suffix);
            std::env::var(&name).with_context(|| format!("missing environment variable {}", name))
        };
        Ok(Self {
            subdomain: var("SUBDOMAIN")?,
            email: var("EMAIL")?,
            token: var("TOKEN")?,
        })
    }
}

/// The source/destination account pair a migration runs between
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: AccountConfig,
    pub destination: AccountConfig,
}

impl Config {
    /// Resolve configuration: an explicit path wins, then the default
    /// config file, then `SOURCE_*`/`TARGET_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if let Some(default) = Self::default_path()
            && default.exists()
        {
            return Self::from_file(&default);
        }

        Ok(Self {
            source: AccountConfig::from_env("SOURCE")?,
            destination: AccountConfig::from_env("TARGET")?,
        })
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zdmigrate").join("config.toml"))
    }
}
