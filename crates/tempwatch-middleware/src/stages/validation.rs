//! Contract validation middleware.
//!
//! Resolves each request to a declared operation and checks it before the
//! handler runs:
//!
//! ```text
//! Request → Logging → [Validation] → Handler
//! ```
//!
//! A request that matches no operation, or that violates the operation's
//! declaration, is answered with `400 {"error": "..."}` and never reaches the
//! handler. On success the resolved operation id and path parameters are
//! recorded on the [`MiddlewareContext`].

use std::sync::Arc;

use http::{header, StatusCode};
use http_body_util::BodyExt;
use tempwatch_contract::{ContractValidator, RequestInput};
use tracing::debug;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};

/// Prefix of every error produced by this stage.
const ERROR_PREFIX: &str = "OpenAPI Middleware";

/// Middleware that enforces the API contract.
#[derive(Clone)]
pub struct ContractValidationMiddleware {
    validator: Arc<dyn ContractValidator>,
}

impl ContractValidationMiddleware {
    /// Creates a validation stage backed by the given validator.
    pub fn new(validator: Arc<dyn ContractValidator>) -> Self {
        Self { validator }
    }

    fn reject(reason: String) -> Response {
        Response::json_error(StatusCode::BAD_REQUEST, &reason)
    }
}

impl std::fmt::Debug for ContractValidationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractValidationMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for ContractValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let route = match self.validator.find_route(request.method(), request.uri().path()) {
                Ok(route) => route,
                Err(e) => {
                    debug!(request_id = %ctx.request_id(), error = %e, "no contract route");
                    return Self::reject(format!("{ERROR_PREFIX}: Error finding route: {e}"));
                }
            };

            // Bodies are collected at the server edge, so this never waits.
            let body = match request.body().clone().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let checked = {
                let content_type = request
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                let input = RequestInput::new(request.method(), request.uri().path())
                    .with_query(request.uri().query())
                    .with_content_type(content_type)
                    .with_body(&body);
                self.validator.validate(&route, &input)
            };

            if let Err(e) = checked {
                debug!(
                    request_id = %ctx.request_id(),
                    operation_id = %route.operation_id,
                    error = %e,
                    "request rejected by contract"
                );
                return Self::reject(format!("{ERROR_PREFIX}: Request validation failed: {e}"));
            }

            ctx.set_operation_id(route.operation_id);
            ctx.set_path_params(route.path_params);
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Method;
    use http_body_util::Full;
    use tempwatch_contract::ContractLoader;

    fn echo_operation(ctx: &MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
        let id = ctx.operation_id().unwrap_or_default().to_string();
        Box::pin(async move { Response::json(StatusCode::OK, &serde_json::json!({ "op": id })) })
    }

    fn stage() -> ContractValidationMiddleware {
        ContractValidationMiddleware::new(Arc::new(ContractLoader::builtin().unwrap()))
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn error_message(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_valid_request_reaches_endpoint() {
        let stage = stage();
        let mut ctx = MiddlewareContext::new("TempPost");
        let req = request(Method::POST, "/api/v1/temp", r#"{"data":"1:2:'Temperature':3"}"#);

        let response = stage.process(&mut ctx, req, Next::endpoint(&echo_operation)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.operation_id(), Some("TempPost"));
    }

    #[tokio::test]
    async fn test_unknown_route_rejected() {
        let stage = stage();
        let mut ctx = MiddlewareContext::unmatched();
        let req = request(Method::GET, "/api/v1/unknown", "");

        let response = stage.process(&mut ctx, req, Next::endpoint(&echo_operation)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_message(response).await,
            "OpenAPI Middleware: Error finding route: no matching operation was found for GET /api/v1/unknown"
        );
        assert!(ctx.operation_id().is_none());
    }

    #[tokio::test]
    async fn test_schema_violation_rejected() {
        let stage = stage();
        let mut ctx = MiddlewareContext::new("TempPost");
        let req = request(Method::POST, "/api/v1/temp", r#"{"data":7}"#);

        let response = stage.process(&mut ctx, req, Next::endpoint(&echo_operation)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = error_message(response).await;
        assert!(message.starts_with("OpenAPI Middleware: Request validation failed: "));
        assert!(message.contains("body.data: expected string, got number"));
    }

    #[tokio::test]
    async fn test_missing_body_rejected() {
        let stage = stage();
        let mut ctx = MiddlewareContext::new("TempPost");
        let req = request(Method::POST, "/api/v1/temp", "");

        let response = stage.process(&mut ctx, req, Next::endpoint(&echo_operation)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("value is required but missing"));
    }
}
