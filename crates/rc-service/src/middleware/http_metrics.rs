//! HTTP metrics middleware for capturing all request/response metrics.
//!
//! Applied as the outermost layer so framework-level errors that occur
//! before handlers run are captured too:
//! - 400 Bad Request (body read errors)
//! - 404 Not Found
//! - 405 Method Not Allowed

use axum::{extract::Request, middleware::Next, response::Response};

use crate::observability::metrics::HttpRequestTimer;

/// Middleware that records HTTP request metrics for all responses.
///
/// Captures the method, the path (normalized to a fixed route set), the
/// response status code, and the request duration.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let timer = HttpRequestTimer::begin(request.method().as_str(), request.uri().path());
    let response = next.run(request).await;
    timer.finish(response.status().as_u16());
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn handler_200() -> &'static str {
        "OK"
    }

    async fn handler_500() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error")
    }

    fn test_app() -> Router {
        Router::new()
            .route("/success", get(handler_200))
            .route("/error", get(handler_500))
            .layer(middleware::from_fn(http_metrics_middleware))
    }

    #[tokio::test]
    async fn test_middleware_passes_through_success() {
        let app = test_app();

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/success")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_passes_through_errors() {
        let app = test_app();

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/error")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_middleware_captures_framework_404() {
        let app = test_app();

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/missing")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
