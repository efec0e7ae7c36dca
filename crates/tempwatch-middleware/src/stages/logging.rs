//! Request logging middleware.
//!
//! Runs first in the pipeline and records every request, including the ones
//! the validation stage rejects afterwards. It never short-circuits and never
//! looks at the response.

use tracing::info;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Placeholder logged when the peer address is unknown.
const UNKNOWN_REMOTE: &str = "-";

/// Middleware that logs method, URI, route name and peer address.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLoggingMiddleware;

impl RequestLoggingMiddleware {
    /// Creates a logging middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestLoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let remote = ctx
                .remote_addr()
                .map_or_else(|| UNKNOWN_REMOTE.to_string(), |addr| addr.to_string());

            info!(
                request_id = %ctx.request_id(),
                method = %request.method(),
                uri = %request.uri(),
                route = ctx.route_name(),
                remote = %remote,
                "{}\t{}\t{}\t{}",
                request.method(),
                request.uri(),
                ctx.route_name(),
                remote,
            );

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use std::io;
    use std::sync::{Arc, Mutex};

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

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn teapot(_ctx: &MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
        Box::pin(async { Response::empty(StatusCode::IM_A_TEAPOT) })
    }

    #[tokio::test]
    async fn test_logs_and_passes_through() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut ctx = MiddlewareContext::new("ErrorsGet")
            .with_remote_addr("10.0.0.7:41000".parse().unwrap());
        let request = http::Request::builder()
            .method(Method::GET)
            .uri("/api/v1/errors?verbose=1")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let logging = RequestLoggingMiddleware::new();
        let response = logging
            .process(&mut ctx, request, Next::endpoint(&teapot))
            .await;

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let output = captured.contents();
        assert!(output.contains("GET\t/api/v1/errors?verbose=1\tErrorsGet\t10.0.0.7:41000"));
    }

    #[tokio::test]
    async fn test_unknown_remote() {
        let mut ctx = MiddlewareContext::unmatched();
        let request = http::Request::builder()
            .uri("/nowhere")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = RequestLoggingMiddleware
            .process(&mut ctx, request, Next::endpoint(&teapot))
            .await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
