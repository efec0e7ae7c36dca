//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use serde::{Deserialize, Serialize};
use tempwatch_core::MAX_ERROR_BUFFER_SIZE;
use tempwatch_telemetry::{LogConfig, LogFormat};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use tempwatch_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.api_prefix, "/api/v1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Prefix every API route is mounted under.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Where `GET {api_prefix}/` redirects to.
    #[serde(default = "default_index_location")]
    pub index_location: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Time allowed to receive a request body, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            api_prefix: default_api_prefix(),
            index_location: default_index_location(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_index_location() -> String {
    "/index.html".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Contract configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// Path to a contract document. The built-in contract is used when unset.
    #[serde(default)]
    pub contract_path: Option<String>,
}

/// Error log configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ErrorsConfig {
    /// Number of records kept before the oldest is evicted.
    #[serde(default = "default_error_capacity")]
    pub capacity: usize,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            capacity: default_error_capacity(),
        }
    }
}

fn default_error_capacity() -> usize {
    MAX_ERROR_BUFFER_SIZE
}

/// Temperature rendering configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TemperatureConfig {
    /// Fixed UTC offset (`±HH:MM`) for formatted times. Host local time when unset.
    #[serde(default)]
    pub utc_offset: Option<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable log output.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info", "tempwatch_server=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output layout.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_line_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            file_line_info: false,
        }
    }
}

impl LoggingConfig {
    /// Converts the section into a subscriber configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            file_line_info: self.file_line_info,
            ..base
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
