//! Webhook handler.
//!
//! Implements `POST /livekit/webhook`: verifies the delivery's signature and
//! body digest, logs the event, and always acknowledges with 200 so the
//! media server does not retry. Invalid deliveries are logged at warn level
//! and counted, never bounced.

use crate::observability::metrics;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use common::webhook::WebhookReceiver;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Handler for `POST /livekit/webhook`.
#[instrument(
    skip_all,
    name = "rc.webhook.receive",
    fields(method = "POST", endpoint = "/livekit/webhook")
)]
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let receiver = WebhookReceiver::new(&state.config.api_key, state.config.api_secret.clone());
    match receiver.receive(&body, auth_header) {
        Ok(event) => {
            metrics::record_webhook_event("valid");
            info!(
                target: "rc.handlers.webhook",
                event = %event.event,
                id = event.id.as_deref().unwrap_or(""),
                "Received webhook event"
            );
        }
        Err(e) => {
            metrics::record_webhook_event("invalid");
            warn!(
                target: "rc.handlers.webhook",
                error = %e,
                "Failed to validate webhook event"
            );
        }
    }

    (StatusCode::OK, "ok")
}
