//! HTTP server implementation.
//!
//! The [`Server`] accepts HTTP/1.1 connections, collects each request body
//! once under a size limit and a timeout, picks a route and then runs the
//! request through the middleware pipeline to the route's handler.
//!
//! ```text
//!   TcpListener ─► hyper http1 ─► collect body ─► Router ─► Pipeline ─► handler
//!                                  (limit, timeout)          (logging, validation)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tempwatch_contract::ContractLoader;
//! use tempwatch_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .contract(Arc::new(ContractLoader::builtin()?))
//!         .build()?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use tempwatch_contract::ContractValidator;
use tempwatch_core::{BoundedErrorStore, ErrorStore, TimeDisplay};
use tempwatch_middleware::{
    BoxFuture, Endpoint, MiddlewareContext, Pipeline, Request, RequestLoggingMiddleware, Response,
    ResponseExt,
};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handlers::{
    BodyReader, DeleteErrorsHandler, GetErrorsHandler, HandlerRegistry, IndexHandler,
    NotFoundHandler, TempPostHandler, BODY_READ_FAILED,
};
use crate::router::{RouteMatch, Router, ERRORS_DELETE, ERRORS_GET, INDEX, TEMP_POST};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The tempwatch HTTP server.
pub struct Server {
    config: ServerConfig,
    router: Router,
    pipeline: Pipeline,
    edge: Pipeline,
    handlers: HandlerRegistry,
    fallback: NotFoundHandler,
}

/// Answers requests whose body could not be collected.
fn unreadable_body(_ctx: &MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
    Box::pin(async { Response::json_error(StatusCode::BAD_REQUEST, BODY_READ_FAILED) })
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Dispatches a request whose body has already been collected.
    ///
    /// Requests with no route still go through the pipeline under the
    /// `NotFound` route name, so the validation stage answers them.
    pub async fn handle(&self, request: Request, remote_addr: Option<SocketAddr>) -> Response {
        let (ctx, route) = self.context_for(&request, remote_addr);

        let endpoint: &dyn Endpoint = route
            .as_ref()
            .and_then(|m| self.handlers.get(m.route_name()))
            .unwrap_or(&self.fallback);

        self.pipeline.process(ctx, request, endpoint).await
    }

    /// Answers a request whose body hit the size limit or the read timeout.
    ///
    /// Only the logging stage runs, so the request still gets its access
    /// line while the handlers and the contract never see it.
    async fn reject_unreadable_body(
        &self,
        parts: http::request::Parts,
        remote_addr: Option<SocketAddr>,
    ) -> Response {
        let request = http::Request::from_parts(parts, Full::new(Bytes::new()));
        let (ctx, _) = self.context_for(&request, remote_addr);
        self.edge.process(ctx, request, &unreadable_body).await
    }

    fn context_for(
        &self,
        request: &Request,
        remote_addr: Option<SocketAddr>,
    ) -> (MiddlewareContext, Option<RouteMatch>) {
        let route = self.router.match_route(request.method(), request.uri().path());

        let mut ctx = match &route {
            Some(m) => MiddlewareContext::new(m.route_name()),
            None => MiddlewareContext::unmatched(),
        };
        if let Some(addr) = remote_addr {
            ctx = ctx.with_remote_addr(addr);
        }
        (ctx, route)
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::invalid_address(self.config.http_addr(), e))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.run_on_listener(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener address cannot be read.
    pub async fn run_on_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.serve_connection(stream, remote_addr, shutdown).await {
                                    debug!(remote = %remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        info!(
            timeout = ?shutdown_timeout,
            connections = tracker.active_connections(),
            "waiting for open connections"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                info!("all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                warn!(
                    connections = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }

        info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(request, remote_addr).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                debug!(remote = %remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_incoming(
        &self,
        request: http::Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Response {
        let (parts, body) = request.into_parts();

        let collected = tokio::time::timeout(
            self.config.request_timeout(),
            Limited::new(body, self.config.max_body_bytes()).collect(),
        )
        .await;

        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                warn!(remote = %remote_addr, error = %e, "failed to read request body");
                return self.reject_unreadable_body(parts, Some(remote_addr)).await;
            }
            Err(_) => {
                warn!(remote = %remote_addr, "request body collection timed out");
                return self.reject_unreadable_body(parts, Some(remote_addr)).await;
            }
        };

        let request = http::Request::from_parts(parts, Full::new(body));
        self.handle(request, Some(remote_addr)).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.router.route_names())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    contract: Option<Arc<dyn ContractValidator>>,
    error_store: Option<Arc<dyn ErrorStore>>,
    time_display: TimeDisplay,
    body_reader: Option<Arc<dyn BodyReader>>,
}

impl ServerBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the contract requests are checked against. Required.
    #[must_use]
    pub fn contract(mut self, contract: Arc<dyn ContractValidator>) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Sets the error store. Defaults to a [`BoundedErrorStore`] of 512.
    #[must_use]
    pub fn error_store(mut self, store: Arc<dyn ErrorStore>) -> Self {
        self.error_store = Some(store);
        self
    }

    /// Sets the zone used for `formatted_time`.
    #[must_use]
    pub fn time_display(mut self, time_display: TimeDisplay) -> Self {
        self.time_display = time_display;
        self
    }

    /// Replaces the body reader of the temperature handler.
    #[must_use]
    pub fn body_reader(mut self, reader: Arc<dyn BodyReader>) -> Self {
        self.body_reader = Some(reader);
        self
    }

    /// Builds the server.
    ///
    /// # Errors
    ///
    /// Returns an error if no contract was set or the index location is
    /// not a valid header value.
    pub fn build(self) -> ServerResult<Server> {
        let contract = self.contract.ok_or(ServerError::MissingContract)?;
        let store = self
            .error_store
            .unwrap_or_else(|| Arc::new(BoundedErrorStore::new()));

        let location = HeaderValue::from_str(self.config.index_location())
            .map_err(|_| ServerError::InvalidIndexLocation(self.config.index_location().to_string()))?;

        let mut temp_post = TempPostHandler::new(Arc::clone(&store), self.time_display);
        if let Some(reader) = self.body_reader {
            temp_post = temp_post.with_body_reader(reader);
        }

        let mut handlers = HandlerRegistry::new();
        handlers.register(INDEX, IndexHandler::new(location));
        handlers.register(ERRORS_DELETE, DeleteErrorsHandler::new(Arc::clone(&store)));
        handlers.register(ERRORS_GET, GetErrorsHandler::new(store));
        handlers.register(TEMP_POST, temp_post);

        let router = Router::standard(self.config.api_prefix());
        let pipeline = Pipeline::new(contract);

        info!(
            prefix = self.config.api_prefix(),
            routes = router.route_count(),
            stages = ?pipeline.stage_names(),
            "server configured"
        );

        Ok(Server {
            config: self.config,
            router,
            pipeline,
            edge: Pipeline::builder().add_stage(RequestLoggingMiddleware::new()).build(),
            handlers,
            fallback: NotFoundHandler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempwatch_contract::ContractLoader;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn builtin() -> Arc<dyn ContractValidator> {
        Arc::new(ContractLoader::builtin().unwrap())
    }

    fn request(method: http::Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_build_requires_contract() {
        let err = Server::builder().build().unwrap_err();
        assert!(matches!(err, ServerError::MissingContract));
    }

    #[test]
    fn test_build_rejects_bad_index_location() {
        let config = ServerConfig::builder().index_location("/index\n.html").build();
        let err = Server::builder()
            .config(config)
            .contract(builtin())
            .build()
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidIndexLocation(_)));
    }

    #[test]
    fn test_every_route_has_a_handler() {
        let server = Server::builder().contract(builtin()).build().unwrap();
        for name in server.router().route_names() {
            assert!(server.handlers.contains(name), "{name} has no handler");
        }
        assert_eq!(server.pipeline().stage_names(), vec!["logging", "validation"]);
    }

    #[tokio::test]
    async fn test_index_redirect() {
        let server = Server::builder().contract(builtin()).build().unwrap();
        let response = server.handle(request(http::Method::GET, "/api/v1/"), None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[http::header::LOCATION], "/index.html");
    }

    #[tokio::test]
    async fn test_unrouted_request_rejected_by_contract() {
        let server = Server::builder().contract(builtin()).build().unwrap();
        let response = server.handle(request(http::Method::GET, "/nowhere"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = Server::builder().contract(builtin()).build().unwrap();
        let (parts, ()) = http::Request::post("/api/v1/temp").body(()).unwrap().into_parts();
        let response = server
            .reject_unreadable_body(parts, Some("10.0.0.9:5000".parse().unwrap()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], BODY_READ_FAILED);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("POST\t/api/v1/temp\tTempPost\t10.0.0.9:5000"), "{logs}");
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let config = ServerConfig::builder().http_addr("not-an-address").build();
        let server = Server::builder().config(config).contract(builtin()).build().unwrap();

        let err = server.run_with_shutdown(ShutdownSignal::new()).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();
        let server = Server::builder().config(config).contract(builtin()).build().unwrap();

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(shutdown)).await;
        assert!(result.unwrap().is_ok());
    }
}
