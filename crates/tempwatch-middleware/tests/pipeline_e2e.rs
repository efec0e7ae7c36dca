//! End-to-end pipeline integration tests.
//!
//! These tests run requests through the standard two-stage pipeline:
//!
//! 1. Logging - always passes through
//! 2. Validation - resolves and checks against the contract

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use tempwatch_contract::{
    ContractError, ContractLoader, ContractResult, ContractValidator, RequestInput,
    RouteResolution, Violation,
};
use tempwatch_middleware::{
    BoxFuture, MiddlewareContext, Pipeline, Request, Response, ResponseExt, Stage,
};

/// Endpoint that reports the operation the pipeline resolved.
fn echo_operation(ctx: &MiddlewareContext, _request: Request) -> BoxFuture<'static, Response> {
    let body = serde_json::json!({
        "operation": ctx.operation_id(),
        "route": ctx.route_name(),
    });
    Box::pin(async move { Response::json(StatusCode::OK, &body) })
}

fn make_request(method: Method, path: &str, body: &'static str) -> Request {
    HttpRequest::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn builtin_pipeline() -> Pipeline {
    Pipeline::new(Arc::new(ContractLoader::builtin().unwrap()))
}

/// Validator double that accepts one path and counts calls.
#[derive(Default)]
struct CountingValidator {
    lookups: AtomicUsize,
    validations: AtomicUsize,
}

impl ContractValidator for CountingValidator {
    fn find_route(&self, method: &Method, path: &str) -> ContractResult<RouteResolution> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if path == "/known" {
            Ok(RouteResolution {
                operation_id: "Known".to_string(),
                path_template: "/known".to_string(),
                path_params: HashMap::new(),
            })
        } else {
            Err(ContractError::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })
        }
    }

    fn validate(&self, route: &RouteResolution, request: &RequestInput<'_>) -> ContractResult<()> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if request.body.is_empty() {
            Ok(())
        } else {
            Err(ContractError::Validation {
                operation_id: route.operation_id.clone(),
                errors: vec![Violation::new("body", "no body expected")],
            })
        }
    }
}

#[test]
fn test_pipeline_has_fixed_stages() {
    let pipeline = builtin_pipeline();
    assert_eq!(pipeline.stage_count(), Stage::all().len());
    assert_eq!(pipeline.stage_names(), vec!["logging", "validation"]);
}

#[tokio::test]
async fn test_declared_routes_reach_handler() {
    let pipeline = builtin_pipeline();
    let cases = [
        (Method::GET, "/api/v1/", "", "Index"),
        (Method::GET, "/api/v1/errors", "", "ErrorsGet"),
        (Method::DELETE, "/api/v1/errors", "", "ErrorsDelete"),
        (Method::POST, "/api/v1/temp", r#"{"data":"1:1:'Temperature':1"}"#, "TempPost"),
    ];

    for (method, path, body, operation) in cases {
        let ctx = MiddlewareContext::new(operation);
        let response = pipeline
            .process(ctx, make_request(method, path, body), &echo_operation)
            .await;

        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(body_json(response).await["operation"], operation);
    }
}

#[tokio::test]
async fn test_unmatched_request_rejected_before_handler() {
    let pipeline = builtin_pipeline();
    let response = pipeline
        .process(
            MiddlewareContext::unmatched(),
            make_request(Method::GET, "/api/v1/nothing-here", ""),
            &echo_operation,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("OpenAPI Middleware: Error finding route: "));
}

#[tokio::test]
async fn test_wrong_method_rejected() {
    let pipeline = builtin_pipeline();
    let response = pipeline
        .process(
            MiddlewareContext::new("TempPost"),
            make_request(Method::GET, "/api/v1/temp", ""),
            &echo_operation,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_body_rejected() {
    let pipeline = builtin_pipeline();
    let response = pipeline
        .process(
            MiddlewareContext::new("TempPost"),
            make_request(Method::POST, "/api/v1/temp", r#"{"data":}"#),
            &echo_operation,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("OpenAPI Middleware: Request validation failed: "));
    assert!(error.contains("invalid JSON"));
}

#[tokio::test]
async fn test_validator_double_substitutes_contract() {
    let validator = Arc::new(CountingValidator::default());
    let pipeline = Pipeline::new(validator.clone());

    let ok = pipeline
        .process(
            MiddlewareContext::new("Known"),
            make_request(Method::GET, "/known", ""),
            &echo_operation,
        )
        .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let rejected = pipeline
        .process(
            MiddlewareContext::new("Known"),
            make_request(Method::GET, "/known", "payload"),
            &echo_operation,
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(rejected).await["error"],
        "OpenAPI Middleware: Request validation failed: request for 'Known' violates the contract: body: no body expected"
    );

    let missing = pipeline
        .process(
            MiddlewareContext::unmatched(),
            make_request(Method::GET, "/unknown", ""),
            &echo_operation,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    assert_eq!(validator.lookups.load(Ordering::SeqCst), 3);
    assert_eq!(validator.validations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let pipeline = Arc::new(builtin_pipeline());
    let mut handles = Vec::new();

    for i in 0..32 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            let path = if i % 2 == 0 { "/api/v1/errors" } else { "/api/v1/missing" };
            let response = pipeline
                .process(
                    MiddlewareContext::new("ErrorsGet"),
                    make_request(Method::GET, path, ""),
                    &echo_operation,
                )
                .await;
            (i, response.status())
        }));
    }

    for handle in handles {
        let (i, status) = handle.await.unwrap();
        let expected = if i % 2 == 0 { StatusCode::OK } else { StatusCode::BAD_REQUEST };
        assert_eq!(status, expected);
    }
}
