//! Route handlers.
//!
//! Every handler is an [`Endpoint`] at the end of the middleware pipeline,
//! so it only ever sees requests the contract already accepted.
//!
//! | Route | Handler |
//! |---|---|
//! | `Index` | [`IndexHandler`] |
//! | `ErrorsGet` | [`GetErrorsHandler`] |
//! | `ErrorsDelete` | [`DeleteErrorsHandler`] |
//! | `TempPost` | [`TempPostHandler`] |

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use thiserror::Error;
use tracing::{debug, warn};

use tempwatch_core::{evaluate, parse_payload, ErrorStore, GetErrorsResponse, TempPostBody, TimeDisplay};
use tempwatch_middleware::{BoxFuture, Endpoint, MiddlewareContext, Request, Response, ResponseExt};

/// Error body when the request body cannot be read.
pub const BODY_READ_FAILED: &str = "Failed to parse request body";

/// Error body when the request body is not the expected JSON envelope.
pub const JSON_DECODE_FAILED: &str = "Failed to parse JSON";

/// Error body when the payload inside the envelope is malformed.
pub const BAD_REQUEST: &str = "bad request";

/// Error body for routes without a handler.
pub const NOT_FOUND: &str = "not found";

/// Failure to obtain the raw request body.
#[derive(Debug, Error)]
#[error("failed to read request body: {0}")]
pub struct BodyReadError(String);

impl BodyReadError {
    /// Creates a body read error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Strategy for reading the raw body of a request.
pub trait BodyReader: Send + Sync {
    /// Consumes the request and returns its body bytes.
    fn read<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Bytes, BodyReadError>>;
}

/// Reads the body already collected at the server edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBodyReader;

impl BodyReader for DefaultBodyReader {
    fn read<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Bytes, BodyReadError>> {
        Box::pin(async move {
            match request.into_body().collect().await {
                Ok(collected) => Ok(collected.to_bytes()),
                Err(never) => match never {},
            }
        })
    }
}

/// Redirects to the landing page.
#[derive(Debug, Clone)]
pub struct IndexHandler {
    location: HeaderValue,
}

impl IndexHandler {
    /// Creates a handler redirecting to `location`.
    pub fn new(location: HeaderValue) -> Self {
        Self { location }
    }
}

impl Endpoint for IndexHandler {
    fn call<'a>(&'a self, _ctx: &'a MiddlewareContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut response = Response::empty(StatusCode::FOUND);
            response
                .headers_mut()
                .insert(header::LOCATION, self.location.clone());
            response
        })
    }
}

/// Lists the recorded payload errors.
pub struct GetErrorsHandler {
    store: Arc<dyn ErrorStore>,
}

impl GetErrorsHandler {
    /// Creates a handler reading from `store`.
    pub fn new(store: Arc<dyn ErrorStore>) -> Self {
        Self { store }
    }
}

impl Endpoint for GetErrorsHandler {
    fn call<'a>(&'a self, _ctx: &'a MiddlewareContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let body = GetErrorsResponse {
                errors: self.store.list(),
            };
            Response::json(StatusCode::OK, &body)
        })
    }
}

/// Clears the recorded payload errors.
pub struct DeleteErrorsHandler {
    store: Arc<dyn ErrorStore>,
}

impl DeleteErrorsHandler {
    /// Creates a handler clearing `store`.
    pub fn new(store: Arc<dyn ErrorStore>) -> Self {
        Self { store }
    }
}

impl Endpoint for DeleteErrorsHandler {
    fn call<'a>(&'a self, ctx: &'a MiddlewareContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            self.store.clear();
            debug!(request_id = %ctx.request_id(), "error store cleared");
            Response::empty(StatusCode::OK)
        })
    }
}

/// Accepts a temperature reading and applies the threshold rule.
///
/// Malformed payloads are recorded in the error store. Bodies that are not
/// a `{"data": string}` envelope are rejected without touching the store.
pub struct TempPostHandler {
    store: Arc<dyn ErrorStore>,
    time_display: TimeDisplay,
    body_reader: Arc<dyn BodyReader>,
}

impl TempPostHandler {
    /// Creates a handler using the default body reader.
    pub fn new(store: Arc<dyn ErrorStore>, time_display: TimeDisplay) -> Self {
        Self {
            store,
            time_display,
            body_reader: Arc::new(DefaultBodyReader),
        }
    }

    /// Replaces the body reader.
    #[must_use]
    pub fn with_body_reader(mut self, body_reader: Arc<dyn BodyReader>) -> Self {
        self.body_reader = body_reader;
        self
    }
}

impl Endpoint for TempPostHandler {
    fn call<'a>(&'a self, ctx: &'a MiddlewareContext, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let body = match self.body_reader.read(request).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(request_id = %ctx.request_id(), error = %e, "could not read temperature body");
                    return Response::json_error(StatusCode::BAD_REQUEST, BODY_READ_FAILED);
                }
            };

            let envelope: TempPostBody = match serde_json::from_slice(&body) {
                Ok(envelope) => envelope,
                Err(e) => {
                    debug!(request_id = %ctx.request_id(), error = %e, "temperature body is not a data envelope");
                    return Response::json_error(StatusCode::BAD_REQUEST, JSON_DECODE_FAILED);
                }
            };

            let result = parse_payload(&envelope.data)
                .and_then(|reading| evaluate(&reading, &self.time_display));

            match result {
                Ok(reading) => Response::json(StatusCode::OK, &reading),
                Err(e) => {
                    self.store.add(e.to_string());
                    Response::json_error(StatusCode::BAD_REQUEST, BAD_REQUEST)
                }
            }
        })
    }
}

/// Answers routes the contract declares but the service does not serve.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundHandler;

impl Endpoint for NotFoundHandler {
    fn call<'a>(&'a self, ctx: &'a MiddlewareContext, _request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            debug!(
                request_id = %ctx.request_id(),
                operation_id = ctx.operation_id().unwrap_or("-"),
                "no handler for operation"
            );
            Response::json_error(StatusCode::NOT_FOUND, NOT_FOUND)
        })
    }
}

/// Handlers keyed by route name.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Endpoint>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one for the route.
    pub fn register<E: Endpoint + 'static>(&mut self, route_name: impl Into<String>, endpoint: E) {
        self.handlers.insert(route_name.into(), Arc::new(endpoint));
    }

    /// Returns the handler for a route.
    #[must_use]
    pub fn get(&self, route_name: &str) -> Option<&dyn Endpoint> {
        self.handlers.get(route_name).map(|h| h.as_ref())
    }

    /// Returns `true` if a handler is registered for the route.
    #[must_use]
    pub fn contains(&self, route_name: &str) -> bool {
        self.handlers.contains_key(route_name)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry").field("routes", &names).finish()
    }
}
