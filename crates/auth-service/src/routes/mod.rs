//! HTTP routes for the auth service.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, TokenVerifier};
use crate::config::Config;
use crate::errors::ApiError;
use crate::handlers;
use crate::services::IdpClient;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token verifier; owns the process-wide key cache.
    pub verifier: Arc<TokenVerifier>,

    /// Password-grant forward for /login.
    pub idp_client: IdpClient,
}

impl AppState {
    /// Build the shared state: one key cache, one verifier, one IdP client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the IdP HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let jwks_client = Arc::new(JwksClient::with_ttl(
            config.jwks_url.clone(),
            config.jwks_cache_ttl,
        ));
        let verifier = Arc::new(TokenVerifier::new(jwks_client, config.issuer_fragment()));
        let idp_client = IdpClient::new(config.token_endpoint(), config.keycloak_client_id.clone())?;

        Ok(Self {
            config,
            verifier,
            idp_client,
        })
    }
}

/// CORS for the browser login page: one origin, credentials allowed.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            tracing::warn!(
                target: "auth.routes",
                allowed_origin = %allowed_origin,
                "Invalid ALLOWED_ORIGIN, cross-origin requests will be refused"
            );
            CorsLayer::new()
        }
    }
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/validate`, `/kong-validate` - Gateway forward-auth
/// - `/login`, `/logout` - Session cookie management
/// - `/health` - Liveness probe
/// - `/metrics` - Prometheus metrics endpoint
/// - CORS for the configured origin
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors_layer(&state.config.allowed_origin);

    let app_routes = Router::new()
        .route("/validate", get(handlers::validate))
        .route("/kong-validate", get(handlers::validate))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflights before anything else
    app_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_app_state_builds_from_default_config() {
        let config = Config::from_vars(&std::collections::HashMap::new()).expect("default config");
        assert!(AppState::new(config).is_ok());
    }
}
