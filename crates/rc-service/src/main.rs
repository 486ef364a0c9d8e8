//! Roomcast Recording Service
//!
//! Thin backend for the Roomcast conferencing demo:
//! - mints room access tokens for the web client
//! - receives and verifies media-server webhooks
//! - starts/stops room recordings through the egress API
//! - lists, streams (with HTTP range support), and deletes recording files
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Ensure the recordings directory exists
//! 4. Build the egress client and application state
//! 5. Serve HTTP

use rc_service::config::Config;
use rc_service::observability::metrics;
use rc_service::routes::{self, AppState};
use rc_service::services::HttpEgressClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rc_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Roomcast recording service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        livekit_url = %config.livekit_url,
        recordings_path = %config.recordings_path.display(),
        "Configuration loaded successfully"
    );

    // Initialize metrics recorder before anything records metrics
    let metrics_handle = metrics::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        anyhow::anyhow!(e)
    })?;

    // Create application state
    let egress = Arc::new(HttpEgressClient::new(
        &config.http_url(),
        &config.api_key,
        config.api_secret.clone(),
    ));
    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config, egress));

    // Ensure the recordings directory exists before serving
    state.storage.ensure_root().await.map_err(|e| {
        error!("Failed to create recordings directory: {}", e);
        e
    })?;

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Recording service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
