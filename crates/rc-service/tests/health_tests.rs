//! Health, readiness, and metrics endpoint integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rc_test_utils::TestServer;

#[tokio::test]
async fn test_health_endpoint_returns_plain_ok() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_reports_recordings_dir() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["recordings_dir"], "available");

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_renders_prometheus_text() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    // Generate at least one request so counters exist.
    reqwest::get(format!("{}/health", server.url())).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_unknown_route_returns_404() -> Result<(), anyhow::Error> {
    let server = TestServer::spawn().await?;

    let response = reqwest::get(format!("{}/does-not-exist", server.url())).await?;

    assert_eq!(response.status(), 404);

    Ok(())
}
