//! Configuration file and defaults
//!
//! Values are resolved in this order:
//! 1. Command-line flag or its environment variable (applied by the binary)
//! 2. `--config` file, or `<config dir>/videonamer/config.toml` when present
//! 3. Compiled defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::providers::ProviderSettings;

const APP_DIR: &str = "videonamer";

/// What a created link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    /// The matched video file
    #[default]
    File,
    /// The directory the matched file was found in
    Directory,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub links_dir: PathBuf,
    pub tracking_file: PathBuf,
    pub language: String,
    pub link_target: LinkTarget,
    pub tmdb_api_key: Option<String>,
    pub tvdb_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            links_dir: default_links_dir(),
            tracking_file: default_tracking_file(),
            language: "en-US".to_string(),
            link_target: LinkTarget::File,
            tmdb_api_key: None,
            tvdb_api_key: None,
        }
    }
}

impl Config {
    /// Loads `explicit` if given (it must exist), otherwise the per-user file
    /// if there is one, otherwise the defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_file().filter(|path| path.exists()) {
                Some(path) => Self::from_file(&path),
                None => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            tmdb_api_key: self.tmdb_api_key.clone(),
            tvdb_api_key: self.tvdb_api_key.clone(),
            language: self.language.clone(),
        }
    }
}

pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn default_links_dir() -> PathBuf {
    dirs::home_dir()
        .map(|d| d.join("video-linked"))
        .unwrap_or_else(|| PathBuf::from("video-linked"))
}

fn default_tracking_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
        .join("tvshows.json")
}
