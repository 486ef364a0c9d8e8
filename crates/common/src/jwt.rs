//! Room access token minting and verification.
//!
//! Access tokens are HS256 JWTs in the LiveKit format: the API key is the
//! issuer, the participant identity is the subject, and permissions travel in
//! a `video` grants claim with camelCase field names. The media server shares
//! the API secret and verifies the signature on connect.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted during verification
//! - The API secret is held as a [`SecretString`] and only exposed at
//!   signing/verification time

use crate::secret::{ExposeSecret, SecretString};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical tokens are 300-600 bytes; anything larger is rejected before
/// base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default access token lifetime (6 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Errors from token minting or verification.
#[derive(Debug, Error)]
pub enum TokenError {
    /// A grant requiring a participant identity was set without one.
    #[error("token grants room access but no identity is set")]
    MissingIdentity,

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Encoding(String),

    /// The token is oversized, malformed, expired, or has a bad signature.
    /// Intentionally generic; the detail is logged at debug level by callers.
    #[error("the access token is invalid or expired")]
    Invalid,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Video grants carried in the `video` claim.
///
/// Serialized with camelCase names to match the media server's format.
/// Unset permissions are omitted from the payload entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoGrants {
    /// Permission to join a room.
    #[serde(skip_serializing_if = "is_false")]
    pub room_join: bool,

    /// Name of the room the grant applies to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub room: String,

    /// Permission to start and stop room egress (recordings).
    #[serde(skip_serializing_if = "is_false")]
    pub room_record: bool,

    /// Permission to publish tracks. Defaults to allowed when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,

    /// Permission to subscribe to tracks. Defaults to allowed when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,

    /// Permission to publish data messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_publish_data: Option<bool>,
}

/// JWT claims for access and webhook tokens.
///
/// Webhook tokens carry no subject or grants, only a `sha256` body digest;
/// both shapes decode into this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer: the API key.
    pub iss: String,

    /// Subject: the participant identity. Absent on webhook tokens.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,

    /// Participant display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Video grants.
    #[serde(default, skip_serializing_if = "is_default_grants")]
    pub video: VideoGrants,

    /// Standard-base64 SHA-256 digest of a webhook body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

fn is_default_grants(grants: &VideoGrants) -> bool {
    *grants == VideoGrants::default()
}

/// Builder for signed access tokens.
///
/// ```rust
/// use common::jwt::{AccessToken, VideoGrants};
/// use common::secret::SecretString;
///
/// let token = AccessToken::new("devkey", SecretString::from("devsecret"))
///     .with_identity("alice")
///     .with_name("Alice")
///     .with_grants(VideoGrants {
///         room_join: true,
///         room: "demo".to_string(),
///         ..Default::default()
///     })
///     .to_jwt()
///     .unwrap();
/// assert!(token.starts_with("ey"));
/// ```
pub struct AccessToken {
    api_key: String,
    api_secret: SecretString,
    identity: String,
    name: Option<String>,
    ttl: Duration,
    grants: VideoGrants,
    sha256: Option<String>,
}

impl AccessToken {
    /// Create a token builder for the given API key pair.
    pub fn new(api_key: &str, api_secret: SecretString) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_secret,
            identity: String::new(),
            name: None,
            ttl: DEFAULT_TOKEN_TTL,
            grants: VideoGrants::default(),
            sha256: None,
        }
    }

    /// Set the participant identity (the JWT subject).
    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    /// Set the participant display name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Override the default 6 hour lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the video grants.
    pub fn with_grants(mut self, grants: VideoGrants) -> Self {
        self.grants = grants;
        self
    }

    /// Attach a body digest claim (webhook tokens).
    pub fn with_sha256(mut self, digest: &str) -> Self {
        self.sha256 = Some(digest.to_string());
        self
    }

    /// Sign and serialize the token.
    pub fn to_jwt(&self) -> Result<String, TokenError> {
        if self.grants.room_join && self.identity.is_empty() {
            return Err(TokenError::MissingIdentity);
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.api_key.clone(),
            sub: self.identity.clone(),
            name: self.name.clone(),
            nbf: now,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
            video: self.grants.clone(),
            sha256: self.sha256.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.api_secret.expose_secret().as_bytes()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }
}

/// Verify a token's signature, expiry, and issuer, returning its claims.
///
/// Used by the webhook receiver and by tests inspecting minted tokens.
pub fn decode_token(
    token: &str,
    api_key: &str,
    api_secret: &SecretString,
) -> Result<Claims, TokenError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(size = token.len(), "rejecting oversized token");
        return Err(TokenError::Invalid);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[api_key]);
    // Webhook tokens omit `sub`; only require what both shapes carry.
    validation.set_required_spec_claims(&["exp", "iss"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(api_secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "token verification failed");
        TokenError::Invalid
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-api-secret")
    }

    fn join_grants(room: &str) -> VideoGrants {
        VideoGrants {
            room_join: true,
            room: room.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = AccessToken::new("test-key", secret())
            .with_identity("alice")
            .with_name("Alice")
            .with_grants(join_grants("demo"))
            .to_jwt()
            .unwrap();

        let claims = decode_token(&token, "test-key", &secret()).unwrap();
        assert_eq!(claims.iss, "test-key");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.name.as_deref(), Some("Alice"));
        assert!(claims.video.room_join);
        assert_eq!(claims.video.room, "demo");
        assert!(!claims.video.room_record);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_room_join_requires_identity() {
        let result = AccessToken::new("test-key", secret())
            .with_grants(join_grants("demo"))
            .to_jwt();
        assert!(matches!(result, Err(TokenError::MissingIdentity)));
    }

    #[test]
    fn test_record_grant_without_identity_is_allowed() {
        let token = AccessToken::new("test-key", secret())
            .with_grants(VideoGrants {
                room_record: true,
                ..Default::default()
            })
            .to_jwt()
            .unwrap();

        let claims = decode_token(&token, "test-key", &secret()).unwrap();
        assert!(claims.video.room_record);
        assert!(claims.sub.is_empty());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = AccessToken::new("test-key", secret())
            .with_identity("alice")
            .with_grants(join_grants("demo"))
            .to_jwt()
            .unwrap();

        let result = decode_token(&token, "test-key", &SecretString::from("other-secret"));
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let token = AccessToken::new("test-key", secret())
            .with_identity("alice")
            .with_grants(join_grants("demo"))
            .to_jwt()
            .unwrap();

        let result = decode_token(&token, "another-key", &secret());
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_oversized_token_is_rejected() {
        let huge = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        let result = decode_token(&huge, "test-key", &secret());
        assert!(matches!(result, Err(TokenError::Invalid)));
    }

    #[test]
    fn test_grants_serialization_omits_unset_fields() {
        let grants = VideoGrants {
            room_join: true,
            room: "demo".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&grants).unwrap();
        assert_eq!(json["roomJoin"], true);
        assert_eq!(json["room"], "demo");
        // Unset permissions must not appear in the payload
        assert!(json.get("roomRecord").is_none());
        assert!(json.get("canPublish").is_none());
        assert!(json.get("canSubscribe").is_none());
    }

    #[test]
    fn test_grants_use_camel_case_names() {
        let grants = VideoGrants {
            room_record: true,
            can_publish: Some(false),
            can_publish_data: Some(true),
            ..Default::default()
        };

        let json = serde_json::to_value(&grants).unwrap();
        assert_eq!(json["roomRecord"], true);
        assert_eq!(json["canPublish"], false);
        assert_eq!(json["canPublishData"], true);
    }

    #[test]
    fn test_claims_payload_shape() {
        let token = AccessToken::new("test-key", secret())
            .with_identity("bob")
            .with_grants(join_grants("standup"))
            .to_jwt()
            .unwrap();

        // Decode the payload segment without verification to inspect raw JSON
        let payload = token.split('.').nth(1).unwrap();
        use base64::Engine as _;
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["iss"], "test-key");
        assert_eq!(json["sub"], "bob");
        assert_eq!(json["video"]["roomJoin"], true);
        assert_eq!(json["video"]["room"], "standup");
        // No webhook digest on access tokens
        assert!(json.get("sha256").is_none());
    }
}
