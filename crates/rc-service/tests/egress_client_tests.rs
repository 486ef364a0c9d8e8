//! Integration tests for the HTTP egress client against a mock Twirp
//! endpoint.
//!
//! Verifies the request shape (path, auth header, camelCase JSON body),
//! response parsing including proto3 string-encoded int64 timestamps, and
//! Twirp error mapping.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::secret::SecretString;
use rc_service::services::{
    EgressClient, EgressError, EncodedFileOutput, HttpEgressClient,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpEgressClient {
    HttpEgressClient::new(&server.uri(), "test-key", SecretString::from("test-api-secret"))
}

#[tokio::test]
async fn test_start_room_composite_posts_twirp_request() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/twirp/livekit.Egress/StartRoomCompositeEgress"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({
            "roomName": "demo-room",
            "fileOutputs": [{"fileType": "MP4", "disableManifest": true}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "egressId": "EG_abc",
            "roomId": "RM_xyz",
            "roomName": "demo-room",
            "status": "EGRESS_STARTING",
            "startedAt": "1712000000123456789",
            "fileResults": [{"filename": "/recordings/demo-room-1712000000-x.mp4"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let output = EncodedFileOutput::mp4_template("/recordings");
    let info = client.start_room_composite("demo-room", &output).await?;

    assert_eq!(info.egress_id, "EG_abc");
    assert_eq!(info.started_at, 1712000000123456789);
    assert_eq!(
        info.first_file_name().as_deref(),
        Some("demo-room-1712000000-x.mp4")
    );

    Ok(())
}

#[tokio::test]
async fn test_stop_egress_posts_egress_id() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/twirp/livekit.Egress/StopEgress"))
        .and(body_partial_json(json!({"egressId": "EG_abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "egressId": "EG_abc",
            "status": "EGRESS_ENDING",
            "fileResults": [{"filename": "/recordings/demo-room-1712000000-x.mp4"}],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let info = client.stop_egress("EG_abc").await?;

    assert_eq!(info.status, "EGRESS_ENDING");

    Ok(())
}

#[tokio::test]
async fn test_twirp_error_maps_to_remote_error() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/twirp/livekit.Egress/StopEgress"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not_found",
            "msg": "egress does not exist",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .stop_egress("EG_missing")
        .await
        .expect_err("expected remote error");

    match error {
        EgressError::Remote { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "egress does not exist");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_unparseable_success_body_is_invalid_response() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/twirp/livekit.Egress/StopEgress"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let error = client
        .stop_egress("EG_abc")
        .await
        .expect_err("expected parse error");

    assert!(matches!(error, EgressError::InvalidResponse(_)));

    Ok(())
}
