//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a [`TempwatchConfig`](crate::TempwatchConfig) could not be built.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The config file exists but could not be read.
    #[error("cannot read config file {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML.
    #[error("malformed TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON.
    #[error("malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A setting parsed but is out of range or inconsistent.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `errors.capacity`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `TEMPWATCH__*` override could not be parsed.
    #[error("cannot apply environment override {var}: {reason}")]
    EnvVar {
        /// Variable name.
        var: String,
        /// Expected shape of the value.
        reason: String,
    },

    /// A `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(String),

    /// The file extension or format name is neither TOML nor JSON.
    #[error("unsupported config format '{0}', expected toml or json")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid value error for a dotted setting name.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_var(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvVar {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
