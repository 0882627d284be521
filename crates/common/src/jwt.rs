//! Unverified JWT header inspection shared across Gokusan services.
//!
//! This module provides the structural pre-checks that run before any key
//! lookup or signature verification:
//! - Size limits for DoS prevention
//! - Three-segment structure check
//! - `alg` and `kid` extraction from the header
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing returned here is trusted; the token MUST still be verified
//! - The `kid` value is only used for key lookup in a trusted key set
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::inspect_header;
//!
//! let header = inspect_header(token)?;
//! let key = jwks_client.get_key(&header.kid).await?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens larger than this are rejected BEFORE base64 decoding or any
/// cryptographic work. Identity-provider access tokens with a handful of realm
/// roles are typically 1-2KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting an unverified token header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenHeaderError {
    /// Token size exceeds maximum allowed.
    #[error("token exceeds maximum size")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("token is not a well-formed JWT")]
    MalformedToken,

    /// Token header has no string `alg`.
    #[error("token header has no algorithm")]
    MissingAlg,

    /// Token header has no non-empty string `kid`.
    #[error("token header has no key identifier")]
    MissingKid,
}

// =============================================================================
// Types
// =============================================================================

/// The two header fields that drive key selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Declared signing algorithm, exactly as written in the header.
    pub alg: String,

    /// Key identifier used to look up the verification key.
    pub kid: String,
}

/// Loosely-typed header view: wrong-typed values are treated as absent.
#[derive(Deserialize)]
struct RawHeader {
    #[serde(default)]
    alg: serde_json::Value,
    #[serde(default)]
    kid: serde_json::Value,
}

// =============================================================================
// Functions
// =============================================================================

/// Inspect a JWT header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong segment count, bad base64url or invalid JSON header
/// - `MissingAlg` - Header `alg` absent or not a string
/// - `MissingKid` - Header `kid` absent, not a string, or empty
pub fn inspect_header(token: &str) -> Result<TokenHeader, TokenHeaderError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(TokenHeaderError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    let (Some(header_part), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(TokenHeaderError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        TokenHeaderError::MalformedToken
    })?;

    let header: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        TokenHeaderError::MalformedToken
    })?;

    let alg = header
        .alg
        .as_str()
        .map(ToString::to_string)
        .ok_or(TokenHeaderError::MissingAlg)?;

    let kid = header
        .kid
        .as_str()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(TokenHeaderError::MissingKid)?;

    Ok(TokenHeader { alg, kid })
}

/// Returns true for the RSA signature algorithms (`RS*` and `PS*`).
#[must_use]
pub fn is_rsa_algorithm(alg: &str) -> bool {
    matches!(
        alg,
        "RS256" | "RS384" | "RS512" | "PS256" | "PS384" | "PS512"
    )
}

// =============================================================================
// Tests
// =============================================================================
