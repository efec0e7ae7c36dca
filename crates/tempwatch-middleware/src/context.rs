//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! set up by the server before dispatch, enriched by the validation stage,
//! and read by handlers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tempwatch_core::RequestId;

/// Route name used when the server has no route for a request.
pub const UNMATCHED_ROUTE: &str = "NotFound";

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use tempwatch_middleware::context::MiddlewareContext;
///
/// let ctx = MiddlewareContext::new("ErrorsGet")
///     .with_remote_addr("127.0.0.1:5000".parse().unwrap());
///
/// assert_eq!(ctx.route_name(), "ErrorsGet");
/// assert!(ctx.operation_id().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Name of the server route that matched.
    route_name: String,

    /// Peer address of the connection.
    remote_addr: Option<SocketAddr>,

    /// The operation id resolved from the contract.
    operation_id: Option<String>,

    /// Path parameters resolved from the contract.
    path_params: HashMap<String, String>,

    /// When the request started processing.
    started_at: Instant,
}

impl MiddlewareContext {
    /// Creates a context for the named route with a fresh request id.
    pub fn new(route_name: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            route_name: route_name.into(),
            remote_addr: None,
            operation_id: None,
            path_params: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a context for a request no server route matched.
    #[must_use]
    pub fn unmatched() -> Self {
        Self::new(UNMATCHED_ROUTE)
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the route name.
    #[must_use]
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    /// Returns the peer address, if known.
    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the resolved operation id, once validation has run.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Sets the operation id.
    ///
    /// This should only be called by the validation stage.
    pub fn set_operation_id(&mut self, operation_id: impl Into<String>) {
        self.operation_id = Some(operation_id.into());
    }

    /// Returns the resolved path parameters.
    #[must_use]
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Returns a single path parameter.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Sets the path parameters.
    pub fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    /// Returns the time elapsed since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
