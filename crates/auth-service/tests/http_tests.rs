//! HTTP surface integration tests.
//!
//! Spawns the real router on a random port with a mocked identity provider and
//! drives it with reqwest.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use auth_test_utils::{MockIdpServer, TestAuthServer, TestKeyPair, TestTokenBuilder};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

async fn setup() -> Result<(MockIdpServer, TestKeyPair, TestAuthServer)> {
    let key = TestKeyPair::primary("abc");
    let idp = MockIdpServer::start().await;
    idp.mount_keys(&[&key]).await;
    let server = TestAuthServer::spawn(&idp).await?;
    Ok((idp, key, server))
}

fn user_token(key: &TestKeyPair, username: &str, roles: &[&str]) -> String {
    TestTokenBuilder::new()
        .preferred_username(username)
        .realm_roles(roles)
        .sign(key)
}

#[tokio::test]
async fn test_validate_with_bearer_token() -> Result<()> {
    let (_idp, key, server) = setup().await?;

    let response = reqwest::Client::new()
        .get(format!("{}/validate", server.url()))
        .bearer_auth(user_token(&key, "alice", &["user"]))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-user-name"], "alice");
    assert_eq!(response.headers()["x-user-role"], "user");
    Ok(())
}

#[tokio::test]
async fn test_validate_with_session_cookie() -> Result<()> {
    let (_idp, key, server) = setup().await?;
    let token = user_token(&key, "bob", &["realm-admin"]);

    let response = reqwest::Client::new()
        .get(format!("{}/kong-validate", server.url()))
        .header(header::COOKIE, format!("theme=dark; auth_token={token}"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-user-name"], "bob");
    assert_eq!(response.headers()["x-user-role"], "admin");
    Ok(())
}

#[tokio::test]
async fn test_validate_without_credentials_is_unauthorized() -> Result<()> {
    let (idp, _key, server) = setup().await?;

    let response = reqwest::get(format!("{}/validate", server.url())).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert!(!response.headers().contains_key("x-user-name"));

    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(idp.jwks_fetch_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_validate_failures_are_indistinguishable() -> Result<()> {
    let (_idp, key, server) = setup().await?;
    let client = reqwest::Client::new();

    let expired = TestTokenBuilder::new()
        .preferred_username("alice")
        .expires_in(-3600)
        .sign(&key);
    let unknown_kid = TestTokenBuilder::new()
        .kid("gone")
        .preferred_username("alice")
        .sign(&key);
    let wrong_realm = TestTokenBuilder::new()
        .issuer("http://keycloak:8080/realms/other")
        .preferred_username("alice")
        .sign(&key);

    let mut bodies = Vec::new();
    for token in [expired, unknown_kid, wrong_realm, "garbage".to_string()] {
        let response = client
            .get(format!("{}/validate", server.url()))
            .bearer_auth(token)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(response.text().await?);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    Ok(())
}

#[tokio::test]
async fn test_login_sets_session_cookie() -> Result<()> {
    let (idp, key, server) = setup().await?;
    let token = user_token(&key, "alice", &["user"]);
    idp.mount_password_grant("alice", &token).await;

    let response = reqwest::Client::new()
        .post(format!("{}/login", server.url()))
        .json(&json!({"username": "alice", "password": "correct-horse"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE].to_str()?.to_string();
    assert!(cookie.starts_with(&format!("auth_token={token};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(cookie.contains("Path=/"));

    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({"success": true, "user": {"name": "alice", "role": "user"}})
    );
    Ok(())
}

#[tokio::test]
async fn test_login_rejected_credentials() -> Result<()> {
    let (idp, _key, server) = setup().await?;
    idp.mount_password_rejection().await;

    let response = reqwest::Client::new()
        .post(format!("{}/login", server.url()))
        .json(&json!({"username": "alice", "password": "wrong"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!response.headers().contains_key(header::SET_COOKIE));

    let body: Value = response.json().await?;
    assert_eq!(body, json!({"success": false, "error": "Invalid credentials"}));
    Ok(())
}

#[tokio::test]
async fn test_login_with_unverifiable_token_is_rejected() -> Result<()> {
    let (idp, _key, server) = setup().await?;
    // IdP hands back a token signed by a key it never published
    let rogue = user_token(&TestKeyPair::secondary("rogue"), "alice", &[]);
    idp.mount_password_grant("alice", &rogue).await;

    let response = reqwest::Client::new()
        .post(format!("{}/login", server.url()))
        .json(&json!({"username": "alice", "password": "pw"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    Ok(())
}

#[tokio::test]
async fn test_login_requires_both_fields() -> Result<()> {
    let (_idp, _key, server) = setup().await?;
    let client = reqwest::Client::new();

    for body in [
        json!({"username": "alice", "password": ""}),
        json!({"username": "", "password": "pw"}),
        json!({"username": "alice"}),
    ] {
        let response = client
            .post(format!("{}/login", server.url()))
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = response.json().await?;
        assert_eq!(body["error"], "Username and password are required");
    }
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_unreadable_body() -> Result<()> {
    let (_idp, _key, server) = setup().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/login", server.url()))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn test_logout_clears_cookie() -> Result<()> {
    let (_idp, _key, server) = setup().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/logout", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str()?.to_string();
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=0"));

    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn test_health_reports_key_cache() -> Result<()> {
    let (_idp, key, server) = setup().await?;
    let client = reqwest::Client::new();

    let before: Value = client
        .get(format!("{}/health", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(before["status"], "healthy");
    assert_eq!(before["jwks_cached_keys"], 0);
    assert_eq!(before["jwks_fresh"], false);

    client
        .get(format!("{}/validate", server.url()))
        .bearer_auth(user_token(&key, "alice", &[]))
        .send()
        .await?;

    let after: Value = client
        .get(format!("{}/health", server.url()))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(after["jwks_cached_keys"], 1);
    assert_eq!(after["jwks_fresh"], true);
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<()> {
    let (_idp, _key, server) = setup().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() -> Result<()> {
    let (_idp, _key, server) = setup().await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/login", server.url()))
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .send()
        .await?;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
    Ok(())
}
