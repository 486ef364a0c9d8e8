//! HTTP routes for the recording service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{EgressClient, RecordingStorage, RecordingTracker};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Egress client for starting and stopping room recordings.
    pub egress: Arc<dyn EgressClient>,

    /// Active recording tracker (room name -> recording).
    pub tracker: RecordingTracker,

    /// Recording files on local disk.
    pub storage: RecordingStorage,
}

impl AppState {
    pub fn new(config: Config, egress: Arc<dyn EgressClient>) -> Self {
        let storage = RecordingStorage::new(&config.recordings_path, config.chunk_size);
        Self {
            config,
            egress,
            tracker: RecordingTracker::new(),
            storage,
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/token` - Access token endpoint
/// - `/livekit/webhook` - Webhook receipt
/// - `/recordings/*` - Recording start/stop/list/stream/delete
/// - `/health`, `/ready` - Liveness and readiness probes
/// - `/metrics` - Prometheus metrics endpoint
/// - Permissive CORS (the demo client is served from another origin)
/// - TraceLayer for request logging
/// - 30 second request timeout
/// - HTTP metrics middleware (outermost, captures framework-level errors)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/token", post(handlers::create_token))
        .route("/livekit/webhook", post(handlers::receive_webhook))
        .route("/recordings/start", post(handlers::start_recording))
        .route("/recordings/stop", post(handlers::stop_recording))
        .route("/recordings", get(handlers::list_recordings))
        .route(
            "/recordings/:name",
            get(handlers::get_recording).delete(handlers::delete_recording),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    api_routes
        .merge(metrics_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_clone() {
        // Handlers clone config fields into minted tokens
        fn assert_clone<T: Clone>() {}
        assert_clone::<Config>();
    }

    #[test]
    fn test_app_state_is_send_sync() {
        // Required for Axum's State extractor across await points
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppState>();
    }
}
