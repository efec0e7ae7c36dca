//! # Tempwatch Middleware
//!
//! The middleware pipeline every tempwatch request flows through.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → Logging → Validation → Handler
//!                         │
//!                         └─ 400 {"error": ...} when the request does not
//!                            resolve to, or conform to, a contract operation
//! ```
//!
//! | Stage | Middleware                        | Purpose                                   |
//! |-------|-----------------------------------|-------------------------------------------|
//! | 1     | [`RequestLoggingMiddleware`]      | Log method, URI, route name, remote addr  |
//! | 2     | [`ContractValidationMiddleware`]  | Resolve and validate against the contract |
//!
//! The order is fixed: logging always sees the request, even when
//! validation rejects it.
//!
//! ## Example
//!
//! ```
//! use tempwatch_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages[0].name(), "logging");
//! assert_eq!(stages[1].name(), "validation");
//! ```

#![doc(html_root_url = "https://docs.rs/tempwatch-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, Endpoint, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use stages::{ContractValidationMiddleware, RequestLoggingMiddleware};
pub use types::{Request, Response, ResponseExt, JSON_CONTENT_TYPE};
