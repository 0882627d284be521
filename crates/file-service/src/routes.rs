//! HTTP routes for the file service.

use crate::handlers;
use axum::{routing::get, Router};
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application routes.
///
/// - `/upload`, `/download` - Require gateway identity headers
/// - `/health` - Liveness probe
pub fn build_routes() -> Router {
    Router::new()
        .route("/upload", get(handlers::upload))
        .route("/download", get(handlers::download))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::identity::{HEADER_USER_NAME, HEADER_USER_ROLE};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get(uri: &str, headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut request = Request::builder().uri(uri);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = build_routes()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_upload_greets_gateway_identity() {
        let (status, body) = get(
            "/upload",
            &[(HEADER_USER_NAME, "alice"), (HEADER_USER_ROLE, "admin")],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Upload successful! Welcome alice (role: admin)");
    }

    #[tokio::test]
    async fn test_download_greets_gateway_identity() {
        let (status, body) = get(
            "/download",
            &[(HEADER_USER_NAME, "bob"), (HEADER_USER_ROLE, "user")],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Download successful! Welcome bob (role: user)");
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        for uri in ["/upload", "/download"] {
            let (status, body) = get(uri, &[(HEADER_USER_NAME, "alice")]).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body, r#"{"error":"Unauthorized"}"#);
        }
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let (status, _) = get(
            "/upload",
            &[(HEADER_USER_NAME, "mallory"), (HEADER_USER_ROLE, "root")],
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health", &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"healthy"}"#);
    }
}
