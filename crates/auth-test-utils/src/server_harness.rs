//! Test server harness for E2E testing
//!
//! Provides `TestAuthServer` for spawning real auth service instances in tests.

use crate::idp_server::{MockIdpServer, TEST_REALM};
use auth_service::config::Config;
use auth_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let idp = MockIdpServer::start().await;
///     let server = TestAuthServer::spawn(&idp).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server pointed at the mock identity provider.
    pub async fn spawn(idp: &MockIdpServer) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(idp, HashMap::new()).await
    }

    /// Spawn with extra environment-style overrides.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Use the mock IdP for both key-set and token endpoints
    /// - Start the HTTP server in the background
    pub async fn spawn_with_vars(
        idp: &MockIdpServer,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("KEYCLOAK_URL".to_string(), idp.uri()),
            ("KEYCLOAK_REALM".to_string(), TEST_REALM.to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(
            AppState::new(config)
                .map_err(|e| anyhow::anyhow!("Failed to create app state: {}", e))?,
        );

        // Each server gets its own recorder; the global one can only be installed once
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(Arc::clone(&state), metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
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

    /// Shared state, for inspecting the key cache.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.state.config
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
