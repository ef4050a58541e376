//! Configuration
//!
//! Settings come from a TOML file in the platform configuration directory,
//! overridden by environment variables and command-line flags in the
//! binary. A missing configuration file simply means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Desktop browser User-Agent the web endpoints expect
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_3) \
    AppleWebKit/537.36 (KHTML, like Gecko) \
    Chrome/56.0.2924.87 Safari/537.36";

pub const DEFAULT_URL_ROOT: &str = "https://www.amazon.com";
pub const DEFAULT_ATV_ROOT: &str = "https://atv-ps.amazon.com/cdp/";

/// Name of the configuration file inside the configuration directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine configuration directory location
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read a configuration or cookie file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for our settings
    #[error("Failed to parse configuration file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cookie header of a logged-in browser session
    pub cookies: Option<String>,
    /// File holding the cookie header, read when `cookies` is unset
    pub cookies_file: Option<PathBuf>,
    /// Device id to present; generated per run when unset
    pub device_id: Option<String>,
    pub user_agent: String,
    pub url_root: String,
    pub atv_root: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cookies: None,
            cookies_file: None,
            device_id: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            url_root: DEFAULT_URL_ROOT.to_string(),
            atv_root: DEFAULT_ATV_ROOT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Returns the platform-specific configuration file path
    ///
    /// - Linux: ~/.config/chakram/config.toml
    /// - macOS: ~/Library/Application Support/chakram/config.toml
    /// - Windows: %APPDATA%\chakram\config\config.toml
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = directories::ProjectDirs::from("", "", "chakram")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;

        Ok(proj_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads configuration
    ///
    /// An explicitly given path must exist. The default path is optional;
    /// when there is no file there, defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;

        let config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed { path: path.clone(), source: e })?;
        debug!(path = %path.display(), "loaded configuration");

        Ok(config)
    }

    /// Fills in the cookie header from `cookies_file` if it isn't set yet
    pub fn resolve_cookies(&mut self) -> Result<(), ConfigError> {
        if self.cookies.is_some() {
            return Ok(());
        }

        if let Some(path) = &self.cookies_file {
            let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
                path: path.clone(),
                source: e,
            })?;
            let cookies = content.trim();
            if !cookies.is_empty() {
                self.cookies = Some(cookies.to_string());
            }
        }

        Ok(())
    }
}
