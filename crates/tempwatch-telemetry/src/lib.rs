//! Logging setup for tempwatch.
//!
//! Every crate in the workspace logs through the [`tracing`] facade. This
//! crate installs the process-wide subscriber once at startup, as JSON lines
//! for production or a pretty layout for development.
//!
//! # Example
//!
//! ```rust,ignore
//! use tempwatch_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! tracing::info!(operation_id = "TempPost", "request accepted");
//! ```

#![doc(html_root_url = "https://docs.rs/tempwatch-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
