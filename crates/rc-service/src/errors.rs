use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service error type, mapped onto HTTP responses.
///
/// 5xx variants carry a client-safe message only; the underlying cause is
/// logged at the call site so infrastructure details never reach clients.
#[derive(Debug, Error)]
pub enum RcError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable,

    #[error("{0}")]
    Internal(String),
}

/// Error body in the wire format the demo client expects.
#[derive(Serialize)]
struct ErrorResponse {
    #[serde(rename = "errorMessage")]
    error_message: String,
}

impl IntoResponse for RcError {
    fn into_response(self) -> Response {
        let status = match &self {
            RcError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RcError::Conflict(_) => StatusCode::CONFLICT,
            RcError::NotFound(_) => StatusCode::NOT_FOUND,
            RcError::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            RcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            error_message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn response_parts(err: RcError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_400() {
        let (status, body) =
            response_parts(RcError::BadRequest("roomName is required".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorMessage"], "roomName is required");
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let (status, body) = response_parts(RcError::Conflict(
            "Recording already started for this room".to_string(),
        ))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errorMessage"], "Recording already started for this room");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, _) = response_parts(RcError::NotFound("Recording not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_range_not_satisfiable_maps_to_416() {
        let (status, body) = response_parts(RcError::RangeNotSatisfiable).await;
        assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(body["errorMessage"], "Requested range not satisfiable");
    }

    #[tokio::test]
    async fn test_internal_maps_to_500_with_generic_message() {
        let (status, body) =
            response_parts(RcError::Internal("Error starting recording".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorMessage"], "Error starting recording");
    }
}
