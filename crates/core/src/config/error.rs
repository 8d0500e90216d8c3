//! Error types for configuration loading.
//!
//! This module defines all errors that can occur while reading
//! `.photo-frame/config.toml` and resolving it into an `AppConfig`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A role pattern is not a valid regular expression.
    #[error("Invalid pattern '{pattern}' for role {role}: {source}")]
    InvalidPattern {
        role: String,
        pattern: String,
        source: regex::Error,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
