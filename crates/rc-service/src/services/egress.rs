//! Client for the media server's Egress RPC API.
//!
//! Recordings are produced server-side by a RoomComposite egress: the media
//! server composites the room and writes an MP4 to the shared recordings
//! directory. The API is Twirp over HTTP
//! (`/twirp/livekit.Egress/<Method>`), JSON-encoded with proto3 JSON field
//! names, authorized by a short-lived access token carrying the
//! `roomRecord` grant.
//!
//! The [`EgressClient`] trait is the seam handlers depend on;
//! [`MockEgressClient`] stands in for the media server in tests.

use async_trait::async_trait;
use common::jwt::{AccessToken, TokenError, VideoGrants};
use common::secret::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Lifetime of the per-call egress auth token.
const EGRESS_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

/// Errors from egress calls.
#[derive(Debug, Error)]
pub enum EgressError {
    /// The egress service could not be reached.
    #[error("failed to reach egress service: {0}")]
    Transport(String),

    /// The egress service rejected the request.
    #[error("egress service returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Minting the auth token failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The response body could not be decoded.
    #[error("invalid egress response: {0}")]
    InvalidResponse(String),
}

/// File output description for an egress request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFileOutput {
    /// Container format, e.g. "MP4".
    pub file_type: String,

    /// Output path template. `{room_name}`, `{time}` and `{room_id}`
    /// placeholders are expanded by the egress service; the file extension
    /// is appended automatically.
    pub filepath: String,

    /// Suppress the JSON manifest the egress service writes next to the file.
    pub disable_manifest: bool,
}

impl EncodedFileOutput {
    /// MP4 output under the given directory, named `{room_name}-{time}-{room_id}`.
    pub fn mp4_template(recordings_dir: &str) -> Self {
        Self {
            file_type: "MP4".to_string(),
            filepath: format!("{recordings_dir}/{{room_name}}-{{time}}-{{room_id}}"),
            disable_manifest: true,
        }
    }
}

/// One produced file in an egress result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileResult {
    pub filename: String,

    #[serde(deserialize_with = "i64_from_string_or_number")]
    pub size: i64,

    #[serde(deserialize_with = "i64_from_string_or_number")]
    pub duration: i64,
}

/// Egress state reported by the media server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EgressInfo {
    pub egress_id: String,

    pub room_id: String,

    pub room_name: String,

    /// e.g. `EGRESS_STARTING`, `EGRESS_ACTIVE`, `EGRESS_COMPLETE`.
    pub status: String,

    /// Nanoseconds since the Unix epoch.
    #[serde(deserialize_with = "i64_from_string_or_number")]
    pub started_at: i64,

    /// Nanoseconds since the Unix epoch, zero while active.
    #[serde(deserialize_with = "i64_from_string_or_number")]
    pub ended_at: i64,

    pub file_results: Vec<FileResult>,
}

impl EgressInfo {
    /// Base name of the first produced file, if any.
    pub fn first_file_name(&self) -> Option<String> {
        self.file_results.first().map(|f| {
            f.filename
                .rsplit('/')
                .next()
                .unwrap_or(f.filename.as_str())
                .to_string()
        })
    }
}

/// proto3 JSON serializes int64 as a string; accept both forms.
fn i64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        String(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Egress operations the handlers need.
#[async_trait]
pub trait EgressClient: Send + Sync {
    /// Start a RoomComposite egress writing to `output`.
    async fn start_room_composite(
        &self,
        room_name: &str,
        output: &EncodedFileOutput,
    ) -> Result<EgressInfo, EgressError>;

    /// Stop a running egress.
    async fn stop_egress(&self, egress_id: &str) -> Result<EgressInfo, EgressError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRoomCompositeRequest<'a> {
    room_name: &'a str,
    file_outputs: Vec<&'a EncodedFileOutput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StopEgressRequest<'a> {
    egress_id: &'a str,
}

/// Twirp error body.
#[derive(Deserialize)]
struct TwirpError {
    #[serde(default)]
    msg: String,
}

/// Egress client talking to a real media server.
pub struct HttpEgressClient {
    base_url: String,
    api_key: String,
    api_secret: SecretString,
    http: reqwest::Client,
}

impl HttpEgressClient {
    /// `base_url` is the media server's HTTP URL (see `Config::http_url`),
    /// without a trailing slash.
    pub fn new(base_url: &str, api_key: &str, api_secret: SecretString) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret,
            http: reqwest::Client::new(),
        }
    }

    fn auth_token(&self) -> Result<String, EgressError> {
        let token = AccessToken::new(&self.api_key, self.api_secret.clone())
            .with_ttl(EGRESS_TOKEN_TTL)
            .with_grants(VideoGrants {
                room_record: true,
                ..Default::default()
            })
            .to_jwt()?;
        Ok(token)
    }

    async fn call<B: Serialize>(&self, method: &str, body: &B) -> Result<EgressInfo, EgressError> {
        let url = format!("{}/twirp/livekit.Egress/{}", self.base_url, method);
        let token = self.auth_token()?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| EgressError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwirpError>(&text)
                .map(|e| e.msg)
                .unwrap_or(text);
            return Err(EgressError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<EgressInfo>()
            .await
            .map_err(|e| EgressError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl EgressClient for HttpEgressClient {
    async fn start_room_composite(
        &self,
        room_name: &str,
        output: &EncodedFileOutput,
    ) -> Result<EgressInfo, EgressError> {
        self.call(
            "StartRoomCompositeEgress",
            &StartRoomCompositeRequest {
                room_name,
                file_outputs: vec![output],
            },
        )
        .await
    }

    async fn stop_egress(&self, egress_id: &str) -> Result<EgressInfo, EgressError> {
        self.call("StopEgress", &StopEgressRequest { egress_id }).await
    }
}

/// A call observed by [`MockEgressClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEgressCall {
    Start { room_name: String, filepath: String },
    Stop { egress_id: String },
}

struct MockEgressState {
    calls: Vec<MockEgressCall>,
    /// egress id -> produced file name, for stop responses.
    active: HashMap<String, (String, String)>,
    next_id: u64,
}

/// In-process stand-in for the egress service.
///
/// Generates deterministic egress ids (`EG_1`, `EG_2`, ...) and expands the
/// filepath template the way the real service does. The failing variant
/// rejects every call, for exercising 500 paths.
pub struct MockEgressClient {
    fail: AtomicBool,
    delay_ms: AtomicU64,
    state: Mutex<MockEgressState>,
}

impl MockEgressClient {
    /// A mock that accepts all start/stop calls.
    pub fn accepting() -> Self {
        Self {
            fail: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            state: Mutex::new(MockEgressState {
                calls: Vec::new(),
                active: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// A mock whose calls all fail with a remote error.
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            delay_ms: AtomicU64::new(0),
            state: Mutex::new(MockEgressState {
                calls: Vec::new(),
                active: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Toggle failure mode at runtime (e.g. fail a stop after a
    /// successful start).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Add latency to every call, to widen race windows in tests.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    async fn simulate_latency(&self) {
        let delay = self.delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    /// Calls observed so far, in order.
    pub async fn calls(&self) -> Vec<MockEgressCall> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl EgressClient for MockEgressClient {
    async fn start_room_composite(
        &self,
        room_name: &str,
        output: &EncodedFileOutput,
    ) -> Result<EgressInfo, EgressError> {
        self.simulate_latency().await;

        let mut state = self.state.lock().await;
        state.calls.push(MockEgressCall::Start {
            room_name: room_name.to_string(),
            filepath: output.filepath.clone(),
        });

        if self.fail.load(Ordering::Relaxed) {
            return Err(EgressError::Remote {
                status: 500,
                message: "egress unavailable".to_string(),
            });
        }

        state.next_id += 1;
        let egress_id = format!("EG_{}", state.next_id);
        let room_id = uuid::Uuid::new_v4().simple().to_string();
        let started_at = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();

        let filename = format!(
            "{}.mp4",
            output
                .filepath
                .replace("{room_name}", room_name)
                .replace("{time}", &(started_at / 1_000_000_000).to_string())
                .replace("{room_id}", &room_id)
        );

        state
            .active
            .insert(egress_id.clone(), (room_name.to_string(), filename.clone()));

        Ok(EgressInfo {
            egress_id,
            room_id,
            room_name: room_name.to_string(),
            status: "EGRESS_STARTING".to_string(),
            started_at,
            ended_at: 0,
            file_results: vec![FileResult {
                filename,
                ..Default::default()
            }],
        })
    }

    async fn stop_egress(&self, egress_id: &str) -> Result<EgressInfo, EgressError> {
        self.simulate_latency().await;

        let mut state = self.state.lock().await;
        state.calls.push(MockEgressCall::Stop {
            egress_id: egress_id.to_string(),
        });

        if self.fail.load(Ordering::Relaxed) {
            return Err(EgressError::Remote {
                status: 500,
                message: "egress unavailable".to_string(),
            });
        }

        let (room_name, filename) =
            state
                .active
                .remove(egress_id)
                .ok_or_else(|| EgressError::Remote {
                    status: 404,
                    message: "egress does not exist".to_string(),
                })?;

        Ok(EgressInfo {
            egress_id: egress_id.to_string(),
            room_name,
            status: "EGRESS_COMPLETE".to_string(),
            ended_at: chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            file_results: vec![FileResult {
                filename,
                ..Default::default()
            }],
            ..Default::default()
        })
    }
}
