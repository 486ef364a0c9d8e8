//! Metrics definitions for the recording service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `rc_` prefix for the recording service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: fixed route set (recording names collapse to a placeholder)
//! - `status`: 3 values (success, error, timeout)
//! - `operation`: start, stop, list, stream, delete
//! - `reason`: bounded by error variants

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP. Must be called once, before any metrics are
/// recorded.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g., already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("rc_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Recording operations include a round trip to the egress service
        .set_buckets_for_metric(
            Matcher::Prefix("rc_recording_operation".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set recording operation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Times one HTTP request from receipt to response.
///
/// Captures the method and path up front (the request is consumed by the
/// handler chain); [`HttpRequestTimer::finish`] records the counter and
/// duration histogram once the status is known.
pub struct HttpRequestTimer {
    start: Instant,
    method: String,
    path: String,
}

impl HttpRequestTimer {
    pub fn begin(method: &str, path: &str) -> Self {
        Self {
            start: Instant::now(),
            method: method.to_string(),
            path: path.to_string(),
        }
    }

    pub fn finish(self, status_code: u16) {
        record_http_request(&self.method, &self.path, status_code, self.start.elapsed());
    }
}

/// Record HTTP request completion.
///
/// Metric: `rc_http_requests_total`, `rc_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures ALL responses including framework-level errors (404, 405, 415).
fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("rc_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("rc_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// Recording file names are replaced with a placeholder.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/" | "/token" | "/livekit/webhook" | "/recordings" | "/recordings/start"
        | "/recordings/stop" | "/health" | "/ready" | "/metrics" => path.to_string(),
        _ if path.starts_with("/recordings/") => "/recordings/{name}".to_string(),
        // Unknown paths normalized to "/other" to bound cardinality
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record an access token issuance attempt.
///
/// Metric: `rc_tokens_issued_total`
/// Labels: `status` (success | error)
pub fn record_token_issued(status: &'static str) {
    counter!("rc_tokens_issued_total", "status" => status).increment(1);
}

// ============================================================================
// Recording Metrics
// ============================================================================

/// Record a recording operation and its outcome.
///
/// Metric: `rc_recording_operations_total`,
/// `rc_recording_operation_duration_seconds`
/// Labels: `operation` (start | stop | list | stream | delete),
/// `status` (success | error), `reason` (bounded error cause, success = "none")
pub fn record_recording_operation(
    operation: &'static str,
    status: &'static str,
    reason: Option<&'static str>,
    duration: Duration,
) {
    counter!("rc_recording_operations_total",
        "operation" => operation,
        "status" => status,
        "reason" => reason.unwrap_or("none")
    )
    .increment(1);

    histogram!("rc_recording_operation_duration_seconds",
        "operation" => operation,
        "status" => status
    )
    .record(duration.as_secs_f64());
}

/// Update the active recordings gauge.
///
/// Metric: `rc_active_recordings`
pub fn set_active_recordings(count: usize) {
    gauge!("rc_active_recordings").set(count as f64);
}

// ============================================================================
// Webhook Metrics
// ============================================================================

/// Record a webhook delivery.
///
/// Metric: `rc_webhook_events_total`
/// Labels: `status` (valid | invalid)
pub fn record_webhook_event(status: &'static str) {
    counter!("rc_webhook_events_total", "status" => status).increment(1);
}
