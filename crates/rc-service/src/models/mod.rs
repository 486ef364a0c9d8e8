//! Request and response types for the Roomcast HTTP API.
//!
//! Field names are camelCase on the wire, matching what the demo client
//! sends and expects.

use serde::{Deserialize, Serialize};

/// Body of `POST /token`.
///
/// Both fields are required; they are `Option` so missing fields surface as
/// a 400 with a message instead of a deserialization error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub room_name: Option<String>,

    #[serde(default)]
    pub participant_name: Option<String>,
}

/// Response of `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `POST /recordings/start` and `POST /recordings/stop`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    #[serde(default)]
    pub room_name: Option<String>,
}

/// A recording descriptor returned from start/stop calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    /// Recording file name (base name, no directory).
    pub name: String,

    /// Start time in milliseconds since the Unix epoch. Only present on
    /// start responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
}

/// Response of `POST /recordings/start` and `POST /recordings/stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingActionResponse {
    pub message: String,
    pub recording: RecordingInfo,
}

/// Query parameters of `GET /recordings`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListRecordingsParams {
    /// Substring filter on file names (the client passes the room name).
    #[serde(default, rename = "roomId")]
    pub room_id: Option<String>,
}

/// One entry in a recording listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingEntry {
    pub name: String,
}

/// Response of `GET /recordings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingListResponse {
    pub recordings: Vec<RecordingEntry>,
}

/// Response of `DELETE /recordings/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint. Error messages stay generic so
/// infrastructure details are not leaked; details are logged server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    /// Recordings directory status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recordings_dir: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
