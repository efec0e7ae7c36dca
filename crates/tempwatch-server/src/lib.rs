//! # Tempwatch Server
//!
//! HTTP surface of the tempwatch service: the route table, the handlers,
//! and a hyper/tokio server with graceful shutdown.
//!
//! | Method | Path | Route |
//! |---|---|---|
//! | GET | `{prefix}/` | `Index` |
//! | DELETE | `{prefix}/errors` | `ErrorsDelete` |
//! | GET | `{prefix}/errors` | `ErrorsGet` |
//! | POST | `{prefix}/temp` | `TempPost` |
//!
//! Every route runs through the same pipeline: request logging, then
//! contract validation, then the handler.

#![doc(html_root_url = "https://docs.rs/tempwatch-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
pub mod handlers;
pub mod router;
mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ServerError, ServerResult};
pub use handlers::{BodyReadError, BodyReader, DefaultBodyReader};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerBuilder};
pub use shutdown::ShutdownSignal;

/// Version of the tempwatch server.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
