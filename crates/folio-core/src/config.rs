//! Application configuration management.
//!
//! Configuration is stored at `~/.config/folio/config.json` and holds the
//! backend URL and anon key, the owner's last used email, and the
//! preferred content language. Environment variables override the file.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::Language;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "folio";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BACKEND_URL: &str = "FOLIO_SUPABASE_URL";
pub const ENV_ANON_KEY: &str = "FOLIO_SUPABASE_ANON_KEY";
pub const ENV_EMAIL: &str = "FOLIO_EMAIL";
pub const ENV_LANGUAGE: &str = "FOLIO_LANGUAGE";
/// Owner password for non-interactive login. Never written to the config file.
pub const ENV_PASSWORD: &str = "FOLIO_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub last_email: Option<String>,
    #[serde(default)]
    pub language: Language,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
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

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable source; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = Some(url);
        }
        if let Some(key) = get(ENV_ANON_KEY) {
            self.anon_key = Some(key);
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.last_email = Some(email);
        }
        if let Some(lang) = get(ENV_LANGUAGE).and_then(|l| l.parse().ok()) {
            self.language = lang;
        }
    }

    /// Backend URL and anon key, both of which are required to talk to the backend.
    pub fn backend(&self) -> Result<(&str, &str)> {
        let url = match self.backend_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => bail!(
                "{} is required. Set it in the environment, a .env file, or {}",
                ENV_BACKEND_URL,
                CONFIG_FILE
            ),
        };
        let key = match self.anon_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => bail!(
                "{} is required. Set it in the environment, a .env file, or {}",
                ENV_ANON_KEY,
                CONFIG_FILE
            ),
        };
        Ok((url, key))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
