//! Common types used throughout the middleware pipeline.

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use tempwatch_core::ErrorResponse;

/// The HTTP request type used in the middleware pipeline.
///
/// Bodies are collected before the pipeline runs, so every stage can read
/// them without consuming the request.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Content type of every JSON response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a JSON response from a serializable body.
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Response;

    /// Creates a `{"error": message}` response.
    fn json_error(status: StatusCode, message: &str) -> Response;

    /// Creates a response with no body.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
        match serde_json::to_vec(body) {
            Ok(bytes) => http::Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(Full::new(Bytes::from(bytes)))
                .unwrap_or_else(|_| fallback(status)),
            Err(e) => {
                tracing::error!("failed to serialize response body: {}", e);
                fallback(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn json_error(status: StatusCode, message: &str) -> Response {
        Self::json(status, &ErrorResponse::new(message))
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }
}

fn fallback(status: StatusCode) -> Response {
    <Response as ResponseExt>::empty(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_json_error_response() {
        let response = Response::json_error(StatusCode::BAD_REQUEST, "bad request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"bad request"}"#);
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::OK);
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
