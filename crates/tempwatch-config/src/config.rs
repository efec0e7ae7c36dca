//! Top-level configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tempwatch_core::{TimeDisplay, MAX_ERROR_BUFFER_SIZE};
use tempwatch_telemetry::{create_env_filter, LogFormat};

use crate::{
    ConfigError, ContractConfig, ErrorsConfig, LoggingConfig, ServerConfig, TemperatureConfig,
};

/// Complete tempwatch configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use tempwatch_config::TempwatchConfig;
///
/// let config = TempwatchConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TempwatchConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Contract location.
    #[serde(default)]
    pub contract: ContractConfig,

    /// Error log sizing.
    #[serde(default)]
    pub errors: ErrorsConfig,

    /// Temperature rendering.
    #[serde(default)]
    pub temperature: TemperatureConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TempwatchConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        let prefix = &self.server.api_prefix;
        if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
            return Err(ConfigError::invalid_value(
                "server.api_prefix",
                format!("'{prefix}' must start with '/' and must not end with '/'"),
            ));
        }

        if self.server.index_location.is_empty() {
            return Err(ConfigError::invalid_value("server.index_location", "must not be empty"));
        }

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value("server.shutdown_timeout_secs", "must be positive"));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("server.request_timeout_ms", "must be positive"));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value("server.max_body_bytes", "must be positive"));
        }

        if !(1..=MAX_ERROR_BUFFER_SIZE).contains(&self.errors.capacity) {
            return Err(ConfigError::invalid_value(
                "errors.capacity",
                format!("must be between 1 and {MAX_ERROR_BUFFER_SIZE}"),
            ));
        }

        self.time_display()?;

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `server.http_addr` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// Returns the zone formatted temperature times are rendered in.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `temperature.utc_offset` does not parse.
    pub fn time_display(&self) -> Result<TimeDisplay, ConfigError> {
        match &self.temperature.utc_offset {
            None => Ok(TimeDisplay::Local),
            Some(offset) => TimeDisplay::from_offset(offset).ok_or_else(|| {
                ConfigError::invalid_value(
                    "temperature.utc_offset",
                    format!("'{offset}' is not an offset like +02:00 or -04:00"),
                )
            }),
        }
    }

    /// Local development preset: pretty debug logs on the loopback interface.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.file_line_info = true;
        config
    }

    /// Production preset: JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.file_line_info = false;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TempwatchConfig::default().validate().is_ok());
        assert!(TempwatchConfig::development().validate().is_ok());
        assert!(TempwatchConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = TempwatchConfig::default();
        config.server.http_addr = "not-an-address".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_invalid_prefix() {
        for prefix in ["api", "/api/", ""] {
            let mut config = TempwatchConfig::default();
            config.server.api_prefix = prefix.to_string();
            assert!(config.validate().is_err(), "{prefix:?}");
        }

        let mut config = TempwatchConfig::default();
        config.server.api_prefix = "/".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = TempwatchConfig::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = TempwatchConfig::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capacity_range() {
        let mut config = TempwatchConfig::default();
        config.errors.capacity = 0;
        assert!(config.validate().is_err());

        config.errors.capacity = 513;
        assert!(config.validate().is_err());

        config.errors.capacity = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_time_display() {
        let mut config = TempwatchConfig::default();
        assert_eq!(config.time_display().unwrap(), TimeDisplay::Local);

        config.temperature.utc_offset = Some("-04:00".to_string());
        assert!(matches!(config.time_display().unwrap(), TimeDisplay::Fixed(_)));

        config.temperature.utc_offset = Some("EDT".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature.utc_offset"));
    }

    #[test]
    fn test_bad_log_level() {
        let mut config = TempwatchConfig::default();
        config.logging.level = "tempwatch=loud".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }
}
