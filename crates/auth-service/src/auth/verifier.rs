//! Access token verification.
//!
//! Turns a bearer token into a verified [`Identity`], or fails closed.
//!
//! # Security
//!
//! - Tokens are size-checked and structurally inspected BEFORE any key lookup
//! - Only RSA signature algorithms are accepted; `none`, HMAC and every other
//!   family are rejected before the key set is consulted
//! - Expiry and not-before are enforced
//! - The issuer must belong to the configured realm even when the signature is valid

use crate::auth::claims::Claims;
use crate::auth::jwks::{JwksClient, RsaPublicKey};
use crate::errors::AuthError;
use crate::observability::metrics;
use common::identity::Identity;
use common::jwt::{inspect_header, is_rsa_algorithm};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Verifies access tokens against the realm's signing keys.
pub struct TokenVerifier {
    /// Shared key cache.
    jwks_client: Arc<JwksClient>,

    /// Substring every accepted issuer must contain (e.g. `/realms/master`).
    issuer_fragment: String,
}

impl TokenVerifier {
    /// Create a new verifier.
    ///
    /// # Arguments
    ///
    /// * `jwks_client` - Key cache shared with every other verification site
    /// * `issuer_fragment` - Expected realm path, e.g. `/realms/master`
    pub fn new(jwks_client: Arc<JwksClient>, issuer_fragment: impl Into<String>) -> Self {
        Self {
            jwks_client,
            issuer_fragment: issuer_fragment.into(),
        }
    }

    pub fn jwks_client(&self) -> &Arc<JwksClient> {
        &self.jwks_client
    }

    /// Verify a token and derive the caller's identity.
    ///
    /// A single pass with no retries; every failure is terminal.
    ///
    /// # Errors
    ///
    /// - `TokenMalformed` - Bad structure, missing `kid`, or a non-RSA algorithm
    /// - `FetchFailed` / `KeyNotFound` - Propagated unchanged from the key cache
    /// - `TokenInvalid` - Signature, expiry/not-before, or issuer check failed
    /// - `ClaimsMissing` - No `preferred_username`, `name` or `sub`
    #[instrument(skip_all)]
    pub async fn parse_and_validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        let start = Instant::now();
        let result = self.verify(token).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_token_validation(outcome, start.elapsed());

        result
    }

    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        // 1. Unverified header: size cap, structure, alg and kid
        let header = inspect_header(token).map_err(|e| {
            tracing::debug!(target: "auth.verifier", error = %e, "Token header inspection failed");
            AuthError::TokenMalformed(e.to_string())
        })?;

        // 2. Algorithm allow-list, before any key lookup
        if !is_rsa_algorithm(&header.alg) {
            tracing::warn!(target: "auth.verifier", alg = %header.alg, "Rejected non-RSA token algorithm");
            return Err(AuthError::TokenMalformed(format!(
                "algorithm {} is not allowed",
                header.alg
            )));
        }

        let algorithm = decode_header(token)
            .map_err(|e| AuthError::TokenMalformed(format!("invalid header: {e}")))?
            .alg;

        // 3. Resolve key; errors propagate unchanged
        let key = self.jwks_client.get_key(&header.kid).await?;

        // 4. Signature and time claims
        let claims = verify_signature(token, &key, algorithm)?;

        // 5. Issuer
        if !claims.issuer_matches(&self.issuer_fragment) {
            tracing::warn!(
                target: "auth.verifier",
                iss = ?claims.iss,
                expected = %self.issuer_fragment,
                "Token issuer does not match realm"
            );
            return Err(AuthError::TokenInvalid("issuer mismatch".to_string()));
        }

        // 6. Identity
        let name = claims.display_name().ok_or(AuthError::ClaimsMissing)?;
        let role = claims.derive_role(name);

        tracing::debug!(target: "auth.verifier", role = %role, "Token validated successfully");
        Ok(Identity::new(name, role))
    }
}

/// Verify the signature with `key` and decode the claims.
fn verify_signature(
    token: &str,
    key: &RsaPublicKey,
    algorithm: Algorithm,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // No clock slack: a token is dead the second its `exp` passes
    validation.leeway = 0;
    // IdP access tokens carry `aud: account`; nothing here scopes on audience
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &key.decoding_key(), &validation).map_err(|e| {
        tracing::debug!(target: "auth.verifier", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::TokenMalformed(e.to_string())
            }
            _ => AuthError::TokenInvalid(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use common::jwt::MAX_JWT_SIZE_BYTES;

    // Nothing listens here: reaching the key cache would yield FetchFailed
    fn offline_verifier() -> TokenVerifier {
        let jwks = Arc::new(JwksClient::new("http://127.0.0.1:1/certs".to_string()));
        TokenVerifier::new(jwks, "/realms/master")
    }

    fn unsigned_token(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode("signature")
        )
    }

    const PAYLOAD: &str = r#"{"iss":"http://idp/realms/master","sub":"u","exp":4102444800}"#;

    #[tokio::test]
    async fn test_rejects_symmetric_algorithm_before_key_lookup() {
        let token = unsigned_token(r#"{"alg":"HS256","kid":"abc"}"#, PAYLOAD);

        let result = offline_verifier().parse_and_validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::TokenMalformed(_))));
    }

    #[tokio::test]
    async fn test_rejects_none_algorithm() {
        let token = format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none","kid":"abc"}"#),
            URL_SAFE_NO_PAD.encode(PAYLOAD)
        );

        let result = offline_verifier().parse_and_validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::TokenMalformed(_))));
    }

    #[tokio::test]
    async fn test_rejects_other_asymmetric_families() {
        for alg in ["ES256", "EdDSA"] {
            let token = unsigned_token(&format!(r#"{{"alg":"{alg}","kid":"abc"}}"#), PAYLOAD);
            let result = offline_verifier().parse_and_validate_token(&token).await;
            assert!(
                matches!(result, Err(AuthError::TokenMalformed(_))),
                "alg {alg}"
            );
        }
    }

    #[tokio::test]
    async fn test_rejects_missing_kid() {
        let token = unsigned_token(r#"{"alg":"RS256","typ":"JWT"}"#, PAYLOAD);

        let result = offline_verifier().parse_and_validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::TokenMalformed(_))));
    }

    #[tokio::test]
    async fn test_rejects_structural_garbage() {
        let verifier = offline_verifier();
        for token in ["", "not-a-jwt", "a.b", "a.b.c.d", "!!!.b.c"] {
            let result = verifier.parse_and_validate_token(token).await;
            assert!(
                matches!(result, Err(AuthError::TokenMalformed(_))),
                "token {token:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_rejects_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);

        let result = offline_verifier().parse_and_validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::TokenMalformed(_))));
    }

    #[tokio::test]
    async fn test_rsa_token_reaches_key_cache() {
        // Structurally valid RS256 token: the unreachable key set is the failure
        let token = unsigned_token(r#"{"alg":"RS256","kid":"abc"}"#, PAYLOAD);

        let result = offline_verifier().parse_and_validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::FetchFailed(_))));
    }
}
