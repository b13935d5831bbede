//! Shared error types for configuration and file I/O

use thiserror::Error;

/// Errors shared across the workspace's config and storage layers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(String),
}

/// Result alias using the shared Error
pub type Result<T> = std::result::Result<T, Error>;
