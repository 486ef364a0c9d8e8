//! Token handler.
//!
//! Implements `POST /token`: mints a signed access token granting the named
//! participant permission to join the named room. The client hands the token
//! to the media server directly; this service never sees the connection.

use crate::errors::RcError;
use crate::models::{CreateTokenRequest, TokenResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{extract::State, Json};
use common::jwt::{AccessToken, VideoGrants};
use std::sync::Arc;
use tracing::{info, instrument};

const MISSING_FIELDS_MESSAGE: &str = "roomName and participantName are required";

/// Handler for `POST /token`.
///
/// # Response
///
/// - 200 OK: `{"token": "<jwt>"}`
/// - 400 Bad Request: missing or blank `roomName`/`participantName`
/// - 500 Internal Server Error: signing failed
#[instrument(
    skip_all,
    name = "rc.token.create",
    fields(method = "POST", endpoint = "/token")
)]
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<Json<TokenResponse>, RcError> {
    // Deserialize manually to return 400 (not Axum's default 422)
    let request: CreateTokenRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "rc.handlers.token", error = %e, "Invalid request body");
        RcError::BadRequest(MISSING_FIELDS_MESSAGE.to_string())
    })?;

    let room_name = required_field(request.room_name)?;
    let participant_name = required_field(request.participant_name)?;

    let token = AccessToken::new(&state.config.api_key, state.config.api_secret.clone())
        .with_identity(&participant_name)
        .with_name(&participant_name)
        .with_grants(VideoGrants {
            room_join: true,
            room: room_name.clone(),
            ..Default::default()
        })
        .to_jwt()
        .map_err(|e| {
            tracing::error!(target: "rc.handlers.token", error = %e, "Failed to sign access token");
            metrics::record_token_issued("error");
            RcError::Internal("Error creating token".to_string())
        })?;

    metrics::record_token_issued("success");
    info!(
        target: "rc.handlers.token",
        room = %room_name,
        participant = %participant_name,
        "Issued room access token"
    );

    Ok(Json(TokenResponse { token }))
}

fn required_field(value: Option<String>) -> Result<String, RcError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RcError::BadRequest(MISSING_FIELDS_MESSAGE.to_string())),
    }
}
