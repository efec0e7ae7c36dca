//! # Tempwatch Core
//!
//! Core types shared by every tempwatch crate.
//!
//! - [`ErrorStore`] / [`BoundedErrorStore`] - the rolling, thread-safe error log
//! - [`models`] - JSON request and response bodies
//! - [`temperature`] - payload parsing and the over-temperature rule
//! - [`RequestId`] - UUID v7 request identifier
//!
//! ## Example
//!
//! ```
//! use tempwatch_core::{BoundedErrorStore, ErrorStore};
//!
//! let store = BoundedErrorStore::new();
//! store.add("device 7 sent garbage".to_string());
//! assert_eq!(store.list(), vec!["device 7 sent garbage".to_string()]);
//!
//! store.clear();
//! assert!(store.list().is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/tempwatch-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod error_store;
pub mod models;
mod request_id;
pub mod temperature;

pub use error::PayloadError;
pub use error_store::{BoundedErrorStore, ErrorStore, MAX_ERROR_BUFFER_SIZE};
pub use models::{ErrorResponse, GetErrorsResponse, TempPostBody, TempPostResponse, TemperatureReading};
pub use request_id::RequestId;
pub use temperature::{evaluate, parse_payload, TimeDisplay, OVERTEMP_THRESHOLD};
