//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases, blobs and staging area.

use super::constants::*;
use super::fixtures::create_test_db_with_users;
use cd_catalog_server::catalog::CatalogService;
use cd_catalog_server::ingestion::{IngestionConfig, IngestionOrchestrator, StagingArea};
use cd_catalog_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use cd_catalog_server::storage::{LocalBlobStorage, SqliteKeyValueStore, UrlSigner};
use cd_catalog_server::user::{SqliteUserStore, UserManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated storage
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Directory where uploads are staged, for leak checks
    pub staging_dir: PathBuf,

    /// Catalog service for direct inspection in tests
    pub catalog: Arc<CatalogService>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if storage creation fails, the port cannot be bound or the
    /// server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        let (temp_db_dir, db_dir) =
            create_test_db_with_users().expect("Failed to create test database");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let kv_store =
            SqliteKeyValueStore::new(db_dir.join("catalog.db")).expect("Failed to open kv store");
        let catalog = Arc::new(CatalogService::new(Arc::new(kv_store)));

        let user_store =
            SqliteUserStore::new(db_dir.join("user.db")).expect("Failed to open user store");
        let user_manager = Arc::new(UserManager::new(Box::new(user_store)));

        let signer = Arc::new(UrlSigner::new("e2e-secret", base_url.clone()));
        let blobs = Arc::new(LocalBlobStorage::new(db_dir.join("blobs"), signer.clone()));
        blobs.init().await.expect("Failed to create blob dir");

        let staging_dir = db_dir.join("staging");
        let staging = StagingArea::new(&staging_dir, TEST_MAX_ARCHIVE_BYTES as u64);
        staging.init().await.expect("Failed to create staging dir");

        let ingestion = Arc::new(IngestionOrchestrator::new(
            staging,
            blobs.clone(),
            catalog.clone(),
            IngestionConfig::default(),
        ));

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            max_archive_bytes: TEST_MAX_ARCHIVE_BYTES,
        };
        let state = ServerState::new(
            config,
            catalog.clone(),
            user_manager,
            ingestion,
            blobs,
            signer,
        );
        let app = make_app(state);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            staging_dir,
            catalog,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// True when no upload left files behind in the staging area.
    pub fn staging_is_empty(&self) -> bool {
        std::fs::read_dir(&self.staging_dir)
            .expect("Failed to read staging dir")
            .next()
            .is_none()
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
