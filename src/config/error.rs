//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the typed configuration accessors and loaders
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key is not present in any source
    #[error("Configuration key '{key}' is not set")]
    KeyMissing { key: String },

    /// The stored value cannot be parsed into the requested type
    #[error("Configuration key '{key}' should be {expected}, got '{value}'")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        value: String,
    },

    /// A configuration file could not be read or parsed
    #[error("Failed to load configuration from {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    pub fn key_missing(key: impl Into<String>) -> Self {
        Self::KeyMissing { key: key.into() }
    }

    pub fn type_mismatch(
        key: impl Into<String>,
        expected: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
            value: value.into(),
        }
    }
}

/// A specialized Result type for configuration lookups
pub type Result<T> = std::result::Result<T, ConfigError>;
