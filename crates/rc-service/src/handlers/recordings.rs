//! Recording handlers.
//!
//! Implements the recording endpoints:
//!
//! - `POST /recordings/start` - Start a room recording (409 if already recording)
//! - `POST /recordings/stop` - Stop a room recording (409 if not recording)
//! - `GET /recordings?roomId=` - List recording files
//! - `GET /recordings/{name}` - Byte-range video stream
//! - `DELETE /recordings/{name}` - Delete a recording file
//!
//! Recording production is delegated to the egress service; this service
//! only tracks which rooms are recording and serves the files the egress
//! writes to the shared directory. Remote and filesystem failures surface
//! as 500 with a generic message; the cause is logged server-side.

use crate::errors::RcError;
use crate::models::{
    ListRecordingsParams, MessageResponse, RecordingActionResponse, RecordingEntry,
    RecordingInfo, RecordingListResponse, RoomRequest,
};
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::storage::StorageError;
use crate::services::tracker::ActiveRecording;
use crate::services::EncodedFileOutput;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::ReaderStream;
use tracing::{info, instrument, warn};

/// Parse a start/stop body, returning the trimmed room name.
fn parse_room_request(body: &[u8]) -> Result<String, RcError> {
    let request: RoomRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "rc.handlers.recordings", error = %e, "Invalid request body");
        RcError::BadRequest("roomName is required".to_string())
    })?;

    match request.room_name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(RcError::BadRequest("roomName is required".to_string())),
    }
}

// ============================================================================
// Handler: POST /recordings/start
// ============================================================================

/// Handler for `POST /recordings/start`.
///
/// Starts a RoomComposite egress writing an MP4 into the recordings
/// directory and tracks the room as recording.
///
/// # Response
///
/// - 200 OK: `{"message": "Recording started", "recording": {name, startedAt}}`
/// - 400 Bad Request: missing or blank `roomName`
/// - 409 Conflict: a recording is already active for the room
/// - 500 Internal Server Error: egress call failed
#[instrument(
    skip_all,
    name = "rc.recording.start",
    fields(method = "POST", endpoint = "/recordings/start")
)]
pub async fn start_recording(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Json<RecordingActionResponse>, RcError> {
    let start = Instant::now();

    let room_name = parse_room_request(&body).inspect_err(|_| {
        metrics::record_recording_operation("start", "error", Some("bad_request"), start.elapsed());
    })?;

    // Reserve the room before the egress round trip so concurrent starts
    // cannot both pass the duplicate check
    if !state.tracker.begin(&room_name).await {
        metrics::record_recording_operation("start", "error", Some("conflict"), start.elapsed());
        return Err(RcError::Conflict(
            "Recording already started for this room".to_string(),
        ));
    }

    let output = EncodedFileOutput::mp4_template(&state.config.recordings_path.to_string_lossy());

    let egress = match state.egress.start_room_composite(&room_name, &output).await {
        Ok(egress) => egress,
        Err(e) => {
            state.tracker.abort(&room_name).await;
            warn!(
                target: "rc.handlers.recordings",
                room = %room_name,
                error = %e,
                "Failed to start egress"
            );
            metrics::record_recording_operation("start", "error", Some("egress"), start.elapsed());
            return Err(RcError::Internal("Error starting recording".to_string()));
        }
    };

    let Some(name) = egress.first_file_name() else {
        state.tracker.abort(&room_name).await;
        warn!(
            target: "rc.handlers.recordings",
            room = %room_name,
            egress_id = %egress.egress_id,
            "Egress response carries no file result"
        );
        metrics::record_recording_operation("start", "error", Some("egress"), start.elapsed());
        return Err(RcError::Internal("Error starting recording".to_string()));
    };

    // Egress reports nanoseconds; the client expects milliseconds
    let started_at_ms = egress.started_at / 1_000_000;

    state
        .tracker
        .commit(
            &room_name,
            ActiveRecording {
                egress_id: egress.egress_id.clone(),
                file_name: name.clone(),
                started_at_ms,
            },
        )
        .await;
    metrics::set_active_recordings(state.tracker.len().await);
    metrics::record_recording_operation("start", "success", None, start.elapsed());

    info!(
        target: "rc.handlers.recordings",
        room = %room_name,
        egress_id = %egress.egress_id,
        recording = %name,
        "Recording started"
    );

    Ok(Json(RecordingActionResponse {
        message: "Recording started".to_string(),
        recording: RecordingInfo {
            name,
            started_at: Some(started_at_ms),
        },
    }))
}

// ============================================================================
// Handler: POST /recordings/stop
// ============================================================================

/// Handler for `POST /recordings/stop`.
///
/// Stops the tracked egress for the room. The tracker entry is only removed
/// once the egress confirms the stop, so a failed stop can be retried.
///
/// # Response
///
/// - 200 OK: `{"message": "Recording stopped", "recording": {name}}`
/// - 400 Bad Request: missing or blank `roomName`
/// - 409 Conflict: no active recording for the room
/// - 500 Internal Server Error: egress call failed
#[instrument(
    skip_all,
    name = "rc.recording.stop",
    fields(method = "POST", endpoint = "/recordings/stop")
)]
pub async fn stop_recording(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Json<RecordingActionResponse>, RcError> {
    let start = Instant::now();

    let room_name = parse_room_request(&body).inspect_err(|_| {
        metrics::record_recording_operation("stop", "error", Some("bad_request"), start.elapsed());
    })?;

    let Some(active) = state.tracker.get(&room_name).await else {
        metrics::record_recording_operation("stop", "error", Some("conflict"), start.elapsed());
        return Err(RcError::Conflict(
            "Recording not started for this room".to_string(),
        ));
    };

    let egress = state
        .egress
        .stop_egress(&active.egress_id)
        .await
        .map_err(|e| {
            warn!(
                target: "rc.handlers.recordings",
                room = %room_name,
                egress_id = %active.egress_id,
                error = %e,
                "Failed to stop egress"
            );
            metrics::record_recording_operation("stop", "error", Some("egress"), start.elapsed());
            RcError::Internal("Error stopping recording".to_string())
        })?;

    let name = egress.first_file_name().unwrap_or(active.file_name);

    state.tracker.remove(&room_name).await;
    metrics::set_active_recordings(state.tracker.len().await);
    metrics::record_recording_operation("stop", "success", None, start.elapsed());

    info!(
        target: "rc.handlers.recordings",
        room = %room_name,
        egress_id = %active.egress_id,
        recording = %name,
        "Recording stopped"
    );

    Ok(Json(RecordingActionResponse {
        message: "Recording stopped".to_string(),
        recording: RecordingInfo {
            name,
            started_at: None,
        },
    }))
}

// ============================================================================
// Handler: GET /recordings
// ============================================================================

/// Handler for `GET /recordings?roomId=`.
///
/// Lists recording file names, optionally filtered by substring (the demo
/// client passes the room name).
#[instrument(
    skip_all,
    name = "rc.recording.list",
    fields(method = "GET", endpoint = "/recordings")
)]
pub async fn list_recordings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRecordingsParams>,
) -> Result<Json<RecordingListResponse>, RcError> {
    let start = Instant::now();

    let names = state
        .storage
        .list(params.room_id.as_deref())
        .await
        .map_err(|e| {
            warn!(target: "rc.handlers.recordings", error = %e, "Failed to list recordings");
            metrics::record_recording_operation("list", "error", Some("storage"), start.elapsed());
            RcError::Internal("Error listing recordings".to_string())
        })?;

    metrics::record_recording_operation("list", "success", None, start.elapsed());

    Ok(Json(RecordingListResponse {
        recordings: names
            .into_iter()
            .map(|name| RecordingEntry { name })
            .collect(),
    }))
}

// ============================================================================
// Handler: GET /recordings/{name}
// ============================================================================

/// Handler for `GET /recordings/{name}`.
///
/// Streams a byte window of the recording. The response is always
/// `206 Partial Content` with a `Content-Range` header; without a `Range`
/// header the window covers the whole file. Open-ended ranges are limited
/// to the configured chunk size.
///
/// # Response
///
/// - 206 Partial Content: the requested byte window
/// - 404 Not Found: no such recording
/// - 416 Range Not Satisfiable: window starts at or past EOF
#[instrument(
    skip_all,
    name = "rc.recording.stream",
    fields(method = "GET", endpoint = "/recordings/{name}")
)]
pub async fn get_recording(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, RcError> {
    let start = Instant::now();

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    let stream = state
        .storage
        .stream(&name, range_header)
        .await
        .map_err(|e| match e {
            StorageError::NotFound => {
                metrics::record_recording_operation(
                    "stream",
                    "error",
                    Some("not_found"),
                    start.elapsed(),
                );
                RcError::NotFound("Recording not found".to_string())
            }
            StorageError::Unsatisfiable => {
                metrics::record_recording_operation(
                    "stream",
                    "error",
                    Some("bad_range"),
                    start.elapsed(),
                );
                RcError::RangeNotSatisfiable
            }
            StorageError::Io(e) => {
                warn!(
                    target: "rc.handlers.recordings",
                    recording = %name,
                    error = %e,
                    "Failed to open recording"
                );
                metrics::record_recording_operation(
                    "stream",
                    "error",
                    Some("storage"),
                    start.elapsed(),
                );
                RcError::Internal("Error streaming recording".to_string())
            }
        })?;

    metrics::record_recording_operation("stream", "success", None, start.elapsed());

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, stream.range.len())
        .header(
            header::CONTENT_RANGE,
            stream.range.content_range(stream.file_size),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(ReaderStream::new(stream.reader)))
        .map_err(|e| {
            warn!(target: "rc.handlers.recordings", error = %e, "Failed to build stream response");
            RcError::Internal("Error streaming recording".to_string())
        })
}

// ============================================================================
// Handler: DELETE /recordings/{name}
// ============================================================================

/// Handler for `DELETE /recordings/{name}`.
///
/// # Response
///
/// - 200 OK: `{"message": "Recording deleted"}`
/// - 404 Not Found: no such recording
/// - 500 Internal Server Error: filesystem error
#[instrument(
    skip_all,
    name = "rc.recording.delete",
    fields(method = "DELETE", endpoint = "/recordings/{name}")
)]
pub async fn delete_recording(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, RcError> {
    let start = Instant::now();

    let deleted = state.storage.delete(&name).await.map_err(|e| {
        warn!(
            target: "rc.handlers.recordings",
            recording = %name,
            error = %e,
            "Failed to delete recording"
        );
        metrics::record_recording_operation("delete", "error", Some("storage"), start.elapsed());
        RcError::Internal("Error deleting recording".to_string())
    })?;

    if !deleted {
        metrics::record_recording_operation("delete", "error", Some("not_found"), start.elapsed());
        return Err(RcError::NotFound("Recording not found".to_string()));
    }

    metrics::record_recording_operation("delete", "success", None, start.elapsed());
    info!(target: "rc.handlers.recordings", recording = %name, "Recording deleted");

    Ok(Json(MessageResponse {
        message: "Recording deleted".to_string(),
    }))
}
