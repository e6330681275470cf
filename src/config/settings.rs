//! Server settings
//!
//! Manages HTTP server settings stored in ~/.salesboard/config.toml.
//! `PORT` in the environment overrides the file.

use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub cors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: default_true(),
        }
    }
}

impl Settings {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply `PORT` from the environment
    fn apply_env<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("Invalid PORT: {}", port)))?;
        }
        Ok(self)
    }
}

/// Get the config directory path (~/.salesboard/)
pub fn config_dir() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".salesboard"))
}

/// Parse settings from TOML text
pub fn parse_settings(content: &str) -> ConfigResult<Settings> {
    Ok(toml::from_str(content)?)
}

/// Load settings from an explicit file, or from the default location when
/// `path` is `None`. A missing default file yields defaults; a missing
/// explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> ConfigResult<Settings> {
    let settings = match path {
        Some(path) => read_settings(path)?,
        None => {
            let default_path = config_dir()?.join("config.toml");
            if default_path.exists() {
                read_settings(&default_path)?
            } else {
                Settings::default()
            }
        }
    };
    settings.apply_env(|key| std::env::var(key).ok())
}

fn read_settings(path: &Path) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::NotFound(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_settings(&content)
}
