//! Health check handler.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Keys in the current key-set snapshot (stale or fresh).
    pub jwks_cached_keys: usize,

    /// Whether the key-set snapshot is within its TTL.
    pub jwks_fresh: bool,
}

/// Handler for GET /health
///
/// Liveness only: never touches the identity provider. An empty or stale key
/// cache is normal before the first verification.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "jwks_cached_keys": 2,
///   "jwks_fresh": true
/// }
/// ```
#[instrument(skip_all, name = "auth.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let jwks = state.verifier.jwks_client();

    Json(HealthResponse {
        status: "healthy",
        jwks_cached_keys: jwks.cached_key_count().await,
        jwks_fresh: jwks.is_fresh().await,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            jwks_cached_keys: 0,
            jwks_fresh: false,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "healthy", "jwks_cached_keys": 0, "jwks_fresh": false})
        );
    }
}
