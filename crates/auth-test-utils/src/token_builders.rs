//! Builder patterns for test data construction
//!
//! Provides a fluent API for creating signed access tokens shaped like the
//! ones the realm's identity provider issues.

use crate::crypto_fixtures::TestKeyPair;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{json, Map, Value};

/// Issuer used by default; matches the default realm `master`.
pub const DEFAULT_ISSUER: &str = "http://keycloak:8080/realms/master";

/// Builder for creating signed test access tokens
///
/// Defaults: RS256, issuer of realm `master`, `sub = "test-subject"`,
/// expiring in one hour, no `preferred_username`/`name`/`realm_access`.
///
/// # Example
/// ```rust,ignore
/// let key = TestKeyPair::primary("abc");
/// let token = TestTokenBuilder::new()
///     .preferred_username("alice")
///     .realm_roles(&["user"])
///     .expires_in(3600)
///     .sign(&key);
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    algorithm: Algorithm,
    kid: Option<String>,
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(DEFAULT_ISSUER));
        claims.insert("sub".to_string(), json!("test-subject"));
        claims.insert("aud".to_string(), json!("account"));
        claims.insert("typ".to_string(), json!("Bearer"));
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );

        Self {
            claims,
            algorithm: Algorithm::RS256,
            kid: None,
        }
    }

    /// Set the issuer
    pub fn issuer(self, iss: &str) -> Self {
        self.with_claim("iss", json!(iss))
    }

    /// Set `preferred_username`
    pub fn preferred_username(self, username: &str) -> Self {
        self.with_claim("preferred_username", json!(username))
    }

    /// Set `name`
    pub fn name(self, name: &str) -> Self {
        self.with_claim("name", json!(name))
    }

    /// Set `sub`
    pub fn subject(self, sub: &str) -> Self {
        self.with_claim("sub", json!(sub))
    }

    /// Set `realm_access.roles`
    pub fn realm_roles(self, roles: &[&str]) -> Self {
        self.with_claim("realm_access", json!({ "roles": roles }))
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(self, seconds: i64) -> Self {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("exp", json!(exp))
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(self, seconds: i64) -> Self {
        let nbf = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("nbf", json!(nbf))
    }

    /// Set an arbitrary claim
    pub fn with_claim(mut self, key: &str, value: Value) -> Self {
        self.claims.insert(key.to_string(), value);
        self
    }

    /// Remove a claim
    pub fn without_claim(mut self, key: &str) -> Self {
        self.claims.remove(key);
        self
    }

    /// Set the header algorithm (must be RSA-family to sign with a fixture key)
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Override the header `kid` (defaults to the signing key's kid)
    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    /// Claims as JSON, for assertions
    pub fn claims(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign with the fixture key
    pub fn sign(&self, key: &TestKeyPair) -> String {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.kid.clone().unwrap_or_else(|| key.kid().to_string()));

        encode(&header, &self.claims, &key.encoding_key()).expect("test token must sign")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::decode_header;

    #[test]
    fn test_builder_defaults() {
        let claims = TestTokenBuilder::new().claims();
        assert_eq!(claims["iss"], DEFAULT_ISSUER);
        assert_eq!(claims["sub"], "test-subject");
        assert!(claims["exp"].as_i64().unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn test_sign_sets_kid_and_alg() {
        let token = TestTokenBuilder::new().sign(&TestKeyPair::primary("abc"));
        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("abc"));
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_kid_override() {
        let token = TestTokenBuilder::new()
            .kid("other")
            .sign(&TestKeyPair::primary("abc"));
        assert_eq!(decode_header(&token).unwrap().kid.as_deref(), Some("other"));
    }

    #[test]
    fn test_without_claim() {
        let claims = TestTokenBuilder::new().without_claim("sub").claims();
        assert!(claims.get("sub").is_none());
    }
}
