//! Error types shared across the resolver and its collaborators

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a metadata provider search
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider answered but had nothing matching the query
    #[error("nothing found for {0:?}")]
    NotFound(String),

    /// The provider could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The provider rejected the request or sent something unreadable
    #[error("provider error {code}: {message}")]
    Api { code: u16, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ProviderError::Api {
                code: status.as_u16(),
                message: err.to_string(),
            },
            None => ProviderError::Network(err.to_string()),
        }
    }
}

/// Conditions that end a run early
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Quit by user")]
    Quit,

    #[error("Input closed before a choice was made")]
    InputClosed,

    #[error("Doesn't look like a path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Couldn't retrieve data: {0}")]
    Fatal(ProviderError),

    #[error("Metadata provider unavailable: {0}")]
    ProviderSetup(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
