//! Core middleware trait and types.
//!
//! A [`Middleware`] sees the request before the handler does and may either
//! delegate to the rest of the chain through [`Next`] or answer directly.
//! The chain ends in an [`Endpoint`], the route handler.
//!
//! # Example
//!
//! ```
//! use tempwatch_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// # Invariants
///
/// - Middleware calls `next.run()` at most once
/// - Middleware that short-circuits returns its own response
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The terminal handler at the end of a middleware chain.
pub trait Endpoint: Send + Sync {
    /// Handles a request that passed every middleware stage.
    fn call<'a>(&'a self, ctx: &'a MiddlewareContext, request: Request) -> BoxFuture<'a, Response>;
}

impl<F> Endpoint for F
where
    F: Fn(&MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a MiddlewareContext, request: Request) -> BoxFuture<'a, Response> {
        self(ctx, request)
    }
}

/// Callback to invoke the next middleware in the chain.
///
/// Consumed by [`Next::run`], so it can be called at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to process
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain
    Endpoint(&'a dyn Endpoint),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given middleware.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the endpoint.
    pub fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Invokes the next middleware or the endpoint.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Endpoint(endpoint) => endpoint.call(ctx, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn name(&self) -> &'static str {
            "short_circuit"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut MiddlewareContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async { Response::json_error(StatusCode::FORBIDDEN, "stop") })
        }
    }

    struct Tagging;

    impl Middleware for Tagging {
        fn name(&self) -> &'static str {
            "tagging"
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                ctx.set_operation_id("tagged");
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn echo_operation(ctx: &MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
        let id = ctx.operation_id().unwrap_or("none").to_string();
        Box::pin(async move { Response::json_error(StatusCode::OK, &id) })
    }

    #[tokio::test]
    async fn test_endpoint_only() {
        let mut ctx = MiddlewareContext::new("test");
        let response = Next::endpoint(&echo_operation).run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_sees_context_before_endpoint() {
        let mut ctx = MiddlewareContext::new("test");
        let tagging = Tagging;
        let next = Next::new(&tagging, Next::endpoint(&echo_operation));

        let response = next.run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.operation_id(), Some("tagged"));
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let mut ctx = MiddlewareContext::new("test");
        let stop = ShortCircuit;
        let tagging = Tagging;
        let next = Next::new(&stop, Next::new(&tagging, Next::endpoint(&echo_operation)));

        let response = next.run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(ctx.operation_id().is_none());
        assert_eq!(stop.name(), "short_circuit");
    }
}
