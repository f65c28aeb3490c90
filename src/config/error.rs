use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Errors raised while locating, reading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set
    #[error("cannot determine config directory: neither XDG_CONFIG_HOME nor HOME is set")]
    NoConfigDir,

    /// I/O operation error
    #[error("I/O error on '{path}': {details}")]
    IoError {
        /// Path where I/O error occurred
        path: PathBuf,
        /// I/O error details
        details: String,
    },

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// A value parsed but is not usable
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfigField {
        /// Dotted path of the field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => p.to_string_lossy().to_string(),
            None => "string".to_string(),
        };

        ConfigError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    pub(crate) fn io(error: &io::Error, path: &Path) -> Self {
        ConfigError::IoError {
            path: path.to_path_buf(),
            details: error.to_string(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfigField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
