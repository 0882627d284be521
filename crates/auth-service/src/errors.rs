//! Auth service error types.
//!
//! Token verification failures use [`AuthError`]: five distinct kinds that are
//! kept apart for logging and metrics, and collapsed into one opaque
//! `401 Unauthorized` toward the client. The rest of the HTTP surface uses
//! [`ApiError`].

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token verification error.
///
/// None of these are retried internally; the caller re-presents credentials.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Key-set endpoint unreachable, non-2xx, or body malformed.
    #[error("Key set fetch failed: {0}")]
    FetchFailed(String),

    /// Key set is well-formed but has no key with this identifier.
    #[error("Signing key not found: {0}")]
    KeyNotFound(String),

    /// Bad token structure or a disallowed algorithm.
    #[error("Malformed token: {0}")]
    TokenMalformed(String),

    /// Signature, expiry/not-before, or issuer check failed.
    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    /// No usable identity claim.
    #[error("Token carries no identity claim")]
    ClaimsMissing,
}

impl AuthError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::FetchFailed(_) => "fetch_failed",
            AuthError::KeyNotFound(_) => "key_not_found",
            AuthError::TokenMalformed(_) => "token_malformed",
            AuthError::TokenInvalid(_) => "token_invalid",
            AuthError::ClaimsMissing => "claims_missing",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Detailed kind stays server-side
        tracing::info!(
            target: "auth.errors",
            kind = self.kind(),
            error = %self,
            "Token verification rejected"
        );

        let body = ErrorResponse {
            error: ErrorDetail {
                code: "UNAUTHORIZED",
                message: "Unauthorized",
            },
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer realm=\"gokusan\", error=\"invalid_token\""),
        );
        response
    }
}

/// Errors for the non-verification HTTP surface (login, logout).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body shape the login page expects on failure.
#[derive(Serialize)]
struct FailureBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::BadRequest(reason) => reason.clone(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::ServiceUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "auth.availability", reason = %reason, "Service unavailable");
                "Service temporarily unavailable".to_string()
            }
            ApiError::Internal => "An internal error occurred".to_string(),
        };

        (
            status,
            Json(FailureBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
