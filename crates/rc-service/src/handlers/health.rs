//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - checks the recordings directory is usable

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Returns a simple "OK" without checking dependencies - failure means the
/// process is hung or deadlocked.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Verifies the recordings directory exists (creating it if necessary),
/// since listing and streaming depend on it. Returns 200 if ready, 503 if
/// not. Error messages are generic; the actual error is logged server-side.
#[tracing::instrument(skip_all, name = "rc.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.storage.ensure_root().await {
        tracing::warn!("Readiness check failed: recordings directory error: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                recordings_dir: Some("unavailable"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            recordings_dir: Some("available"),
            error: None,
        }),
    )
}
