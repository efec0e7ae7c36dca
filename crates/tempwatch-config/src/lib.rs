//! Typed configuration for tempwatch.
//!
//! Configuration is layered: defaults, then a TOML or JSON file, then
//! environment variables. Every section rejects unknown fields.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! api_prefix = "/api/v1"
//! index_location = "/index.html"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 1048576
//!
//! [contract]
//! contract_path = "/etc/tempwatch/contract.json"
//!
//! [errors]
//! capacity = 512
//!
//! [temperature]
//! utc_offset = "-04:00"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `TEMPWATCH__SECTION__KEY`, for example
//! `TEMPWATCH__SERVER__HTTP_ADDR=0.0.0.0:9000` or
//! `TEMPWATCH__TEMPERATURE__UTC_OFFSET=+00:00`.

#![doc(html_root_url = "https://docs.rs/tempwatch-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TempwatchConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
pub use schema::*;
