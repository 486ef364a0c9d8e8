//! Test server harness for E2E testing
//!
//! Provides `TestServer` for spawning real recording-service instances in
//! tests, backed by a temporary recordings directory and a mock egress
//! client.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use rc_service::config::Config;
use rc_service::routes::{self, AppState};
use rc_service::services::MockEgressClient;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// API key the test server is configured with.
pub const TEST_API_KEY: &str = "test-key";

/// API secret the test server is configured with.
pub const TEST_API_SECRET: &str = "test-api-secret";

/// Options for spawning a test server.
pub struct TestServerOptions {
    /// Make every egress call fail with a remote error.
    pub failing_egress: bool,

    /// Byte window served for open-ended range requests.
    pub chunk_size: u64,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            failing_egress: false,
            chunk_size: 1024 * 1024,
        }
    }
}

/// The Prometheus recorder is process-global and can only be installed
/// once; later test servers share the first handle. If another recorder is
/// already installed, fall back to an uninstalled one so tests still run.
fn test_metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            rc_service::observability::metrics::init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the recording service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_e2e() -> Result<(), anyhow::Error> {
///     let server = TestServer::spawn().await?;
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestServer {
    addr: SocketAddr,
    egress: Arc<MockEgressClient>,
    recordings_dir: tempfile::TempDir,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a test server with an accepting mock egress client.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawn a test server with the given options.
    ///
    /// The server binds to a random available port and serves a fresh
    /// temporary recordings directory, removed when the harness drops.
    pub async fn spawn_with(options: TestServerOptions) -> Result<Self, anyhow::Error> {
        let recordings_dir = tempfile::tempdir()?;

        let vars = HashMap::from([
            ("LIVEKIT_API_KEY".to_string(), TEST_API_KEY.to_string()),
            ("LIVEKIT_API_SECRET".to_string(), TEST_API_SECRET.to_string()),
            (
                "RECORDINGS_PATH".to_string(),
                recordings_dir.path().to_string_lossy().into_owned(),
            ),
            (
                "RECORDING_CHUNK_SIZE".to_string(),
                options.chunk_size.to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let egress = if options.failing_egress {
            Arc::new(MockEgressClient::failing())
        } else {
            Arc::new(MockEgressClient::accepting())
        };

        let state = Arc::new(AppState::new(config, egress.clone()));

        // Build routes using the service's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            egress,
            recordings_dir,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The mock egress client behind the server.
    pub fn egress(&self) -> &Arc<MockEgressClient> {
        &self.egress
    }

    /// Path of the server's recordings directory.
    pub fn recordings_dir(&self) -> &Path {
        self.recordings_dir.path()
    }

    /// Write a recording file into the server's recordings directory.
    pub async fn write_recording(
        &self,
        name: &str,
        contents: &[u8],
    ) -> Result<(), anyhow::Error> {
        tokio::fs::write(self.recordings_dir.path().join(name), contents).await?;
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Abort the HTTP server task for immediate cleanup when the test
        // completes.
        self._handle.abort();
    }
}
