//! Auth service configuration.
//!
//! Configuration is loaded from environment variables. Only the key-set URL,
//! the realm (expected issuer fragment) and the cache TTL feed token
//! verification; the rest configures the HTTP surface.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default key-set cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default session cookie lifetime in seconds (24 hours).
pub const DEFAULT_COOKIE_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Identity provider base URL.
    pub keycloak_url: String,

    /// Realm whose tokens are accepted.
    pub keycloak_realm: String,

    /// Client used for the password-grant login forward.
    pub keycloak_client_id: String,

    /// Key-set endpoint. Derived from the IdP URL and realm unless overridden.
    pub jwks_url: String,

    /// How long a fetched key set is trusted before refetching.
    pub jwks_cache_ttl: Duration,

    /// Session cookie name.
    pub cookie_name: String,

    /// Session cookie lifetime in seconds.
    pub cookie_max_age_seconds: u64,

    /// Browser origin allowed by CORS.
    pub allowed_origin: String,

    /// Graceful shutdown drain period in seconds.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let string_or = |name: &str, default: &str| {
            vars.get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let keycloak_url = string_or("KEYCLOAK_URL", "http://keycloak:8080")
            .trim_end_matches('/')
            .to_string();
        let keycloak_realm = string_or("KEYCLOAK_REALM", "master");

        let jwks_url = string_or(
            "JWKS_URL",
            &format!(
                "{}/realms/{}/protocol/openid-connect/certs",
                keycloak_url, keycloak_realm
            ),
        );

        let jwks_cache_ttl = Duration::from_secs(positive_u64(
            vars,
            "JWKS_CACHE_TTL_SECONDS",
            DEFAULT_JWKS_CACHE_TTL_SECONDS,
        )?);

        let cookie_max_age_seconds = positive_u64(
            vars,
            "COOKIE_MAX_AGE_SECONDS",
            DEFAULT_COOKIE_MAX_AGE_SECONDS,
        )?;

        let drain_seconds = match vars.get("DRAIN_SECONDS") {
            Some(value) => value.parse().map_err(|e| ConfigError::InvalidValue {
                name: "DRAIN_SECONDS".to_string(),
                reason: format!("must be a non-negative integer, got '{}': {}", value, e),
            })?,
            None => 0,
        };

        Ok(Config {
            bind_address: string_or("BIND_ADDRESS", "0.0.0.0:8080"),
            keycloak_client_id: string_or("KEYCLOAK_CLIENT_ID", "admin-cli"),
            cookie_name: string_or("COOKIE_NAME", "auth_token"),
            allowed_origin: string_or("ALLOWED_ORIGIN", "http://localhost:5173"),
            keycloak_url,
            keycloak_realm,
            jwks_url,
            jwks_cache_ttl,
            cookie_max_age_seconds,
            drain_seconds,
        })
    }

    /// Issuer substring that every accepted token must carry.
    pub fn issuer_fragment(&self) -> String {
        format!("/realms/{}", self.keycloak_realm)
    }

    /// Identity provider token endpoint used by the login forward.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.keycloak_url, self.keycloak_realm
        )
    }
}

fn positive_u64(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("must be a valid positive integer, got '{}': {}", value_str, e),
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.keycloak_url, "http://keycloak:8080");
        assert_eq!(config.keycloak_realm, "master");
        assert_eq!(config.keycloak_client_id, "admin-cli");
        assert_eq!(
            config.jwks_url,
            "http://keycloak:8080/realms/master/protocol/openid-connect/certs"
        );
        assert_eq!(config.jwks_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cookie_name, "auth_token");
        assert_eq!(config.cookie_max_age_seconds, 86400);
        assert_eq!(config.allowed_origin, "http://localhost:5173");
        assert_eq!(config.drain_seconds, 0);
        assert_eq!(config.issuer_fragment(), "/realms/master");
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string()),
            ("KEYCLOAK_URL".to_string(), "https://idp.example.com/".to_string()),
            ("KEYCLOAK_REALM".to_string(), "gokusan".to_string()),
            ("JWKS_CACHE_TTL_SECONDS".to_string(), "60".to_string()),
            ("COOKIE_NAME".to_string(), "session".to_string()),
            ("DRAIN_SECONDS".to_string(), "5".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.keycloak_url, "https://idp.example.com");
        assert_eq!(
            config.jwks_url,
            "https://idp.example.com/realms/gokusan/protocol/openid-connect/certs"
        );
        assert_eq!(
            config.token_endpoint(),
            "https://idp.example.com/realms/gokusan/protocol/openid-connect/token"
        );
        assert_eq!(config.issuer_fragment(), "/realms/gokusan");
        assert_eq!(config.jwks_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.drain_seconds, 5);
    }

    #[test]
    fn test_jwks_url_override_wins() {
        let vars = HashMap::from([(
            "JWKS_URL".to_string(),
            "http://127.0.0.1:1234/certs".to_string(),
        )]);

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.jwks_url, "http://127.0.0.1:1234/certs");
    }

    #[test]
    fn test_cache_ttl_rejects_zero() {
        let vars = HashMap::from([("JWKS_CACHE_TTL_SECONDS".to_string(), "0".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name, reason })
                if name == "JWKS_CACHE_TTL_SECONDS" && reason.contains("greater than 0")
        ));
    }

    #[test]
    fn test_cache_ttl_rejects_non_numeric() {
        let vars = HashMap::from([("JWKS_CACHE_TTL_SECONDS".to_string(), "5m".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { reason, .. })
                if reason.contains("must be a valid positive integer")
        ));
    }

    #[test]
    fn test_cookie_max_age_rejects_negative() {
        let vars = HashMap::from([("COOKIE_MAX_AGE_SECONDS".to_string(), "-1".to_string())]);

        assert!(Config::from_vars(&vars).is_err());
    }
}
