//! Mock identity provider for integration tests
//!
//! Wraps a `wiremock` server that serves the realm's key-set and token
//! endpoints at the same paths Keycloak uses, so an auth service configured with
//! `KEYCLOAK_URL = server.uri()` needs no further overrides.

use crate::crypto_fixtures::{jwks_body, TestKeyPair};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Realm served by the mock.
pub const TEST_REALM: &str = "master";

/// Mock identity provider.
pub struct MockIdpServer {
    server: MockServer,
}

impl MockIdpServer {
    /// Start an empty mock server.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL (what `KEYCLOAK_URL` should be).
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Path of the key-set endpoint.
    pub fn jwks_path() -> String {
        format!("/realms/{TEST_REALM}/protocol/openid-connect/certs")
    }

    /// Path of the token endpoint.
    pub fn token_path() -> String {
        format!("/realms/{TEST_REALM}/protocol/openid-connect/token")
    }

    /// Full key-set URL.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.uri(), Self::jwks_path())
    }

    /// Issuer that tokens from this realm carry.
    pub fn issuer(&self) -> String {
        format!("{}/realms/{TEST_REALM}", self.uri())
    }

    /// Serve the given keys.
    pub async fn mount_keys(&self, keys: &[&TestKeyPair]) {
        self.mount_jwks_response(ResponseTemplate::new(200).set_body_json(jwks_body(keys)))
            .await;
    }

    /// Serve the given keys after a delay, to hold concurrent callers in flight.
    pub async fn mount_keys_with_delay(&self, keys: &[&TestKeyPair], delay: Duration) {
        self.mount_jwks_response(
            ResponseTemplate::new(200)
                .set_body_json(jwks_body(keys))
                .set_delay(delay),
        )
        .await;
    }

    /// Serve an arbitrary JSON body from the key-set endpoint.
    pub async fn mount_jwks_json(&self, body: Value) {
        self.mount_jwks_response(ResponseTemplate::new(200).set_body_json(body))
            .await;
    }

    /// Fail every key-set request with `status`.
    pub async fn mount_jwks_failure(&self, status: u16) {
        self.mount_jwks_response(ResponseTemplate::new(status))
            .await;
    }

    async fn mount_jwks_response(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(Self::jwks_path()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Accept `username` on the token endpoint and return `access_token`.
    pub async fn mount_password_grant(&self, username: &str, access_token: &str) {
        Mock::given(method("POST"))
            .and(path(Self::token_path()))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains(format!("username={username}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "expires_in": 300,
                "token_type": "Bearer",
            })))
            .mount(&self.server)
            .await;
    }

    /// Reject every password grant the way Keycloak does.
    pub async fn mount_password_rejection(&self) {
        Mock::given(method("POST"))
            .and(path(Self::token_path()))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials",
            })))
            .mount(&self.server)
            .await;
    }

    /// Drop every mounted mock and the request history.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Number of key-set requests received so far.
    pub async fn jwks_fetch_count(&self) -> usize {
        let jwks_path = Self::jwks_path();
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == jwks_path)
            .count()
    }
}
