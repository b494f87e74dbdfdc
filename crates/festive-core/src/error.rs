//! Error types shared across the companion.
//!
//! Each crate defines the errors of its own domain; this module holds the
//! ones tied to local state (config file, preference store) and the
//! top-level `AppError` used at the application boundary.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration file is malformed: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Preference store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
