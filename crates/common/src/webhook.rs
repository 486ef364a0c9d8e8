//! Webhook receipt verification.
//!
//! The media server delivers webhook events as JSON with an `Authorization`
//! header containing a JWT signed with the API secret. The token's `sha256`
//! claim is the standard-base64 SHA-256 digest of the raw body, binding the
//! signature to the payload. Events with a bad signature or a digest mismatch
//! are rejected.

use crate::jwt::{decode_token, TokenError};
use crate::secret::SecretString;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ring::digest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from webhook verification.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or non-bearer `Authorization` header value.
    #[error("missing or malformed authorization header")]
    MissingAuth,

    /// The auth token failed signature or issuer validation.
    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    /// The token carries no body digest claim.
    #[error("auth token carries no sha256 claim")]
    MissingDigest,

    /// The body digest does not match the token's `sha256` claim.
    #[error("body digest does not match the signed sha256 claim")]
    DigestMismatch,

    /// The body is not valid JSON.
    #[error("invalid webhook body: {0}")]
    InvalidBody(String),
}

/// A received webhook event.
///
/// Only the event name and identifiers are modeled; the remaining payload
/// (room, participant, egress info) is retained as raw JSON for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `room_started`, `egress_ended`.
    pub event: String,

    /// Unique event id, used by senders for deduplication.
    #[serde(default)]
    pub id: Option<String>,

    /// Unix timestamp the event was created at.
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<i64>,

    /// Remaining event payload.
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Verifies and decodes webhook deliveries for one API key pair.
pub struct WebhookReceiver {
    api_key: String,
    api_secret: SecretString,
}

impl WebhookReceiver {
    pub fn new(api_key: &str, api_secret: SecretString) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_secret,
        }
    }

    /// Verify a delivery and parse the event.
    ///
    /// `auth_header` is the raw `Authorization` header value; a `Bearer `
    /// prefix is accepted and stripped.
    pub fn receive(&self, body: &str, auth_header: &str) -> Result<WebhookEvent, WebhookError> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .unwrap_or(auth_header)
            .trim();
        if token.is_empty() {
            return Err(WebhookError::MissingAuth);
        }

        let claims = decode_token(token, &self.api_key, &self.api_secret)?;
        let expected = claims.sha256.ok_or(WebhookError::MissingDigest)?;

        let actual = STANDARD.encode(digest::digest(&digest::SHA256, body.as_bytes()));
        if actual != expected {
            return Err(WebhookError::DigestMismatch);
        }

        serde_json::from_str(body).map_err(|e| WebhookError::InvalidBody(e.to_string()))
    }
}

/// Compute the standard-base64 SHA-256 digest of a webhook body.
///
/// Exposed for tests and tooling that mint webhook deliveries.
pub fn body_digest(body: &str) -> String {
    STANDARD.encode(digest::digest(&digest::SHA256, body.as_bytes()))
}
