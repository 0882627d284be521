//! Login and logout handlers.
//!
//! Login is a thin forward: credentials go to the identity provider's token
//! endpoint, and the returned access token is verified like any gateway request
//! before it is placed in the HttpOnly session cookie.

use crate::errors::ApiError;
use crate::routes::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::identity::Identity;
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Successful login body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Identity,
}

/// Logout body.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `Set-Cookie` value for a new session.
pub fn session_cookie(name: &str, token: &str, max_age_seconds: u64) -> String {
    format!("{name}={token}; Path=/; Max-Age={max_age_seconds}; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that clears the session.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Handler for POST /login
///
/// # Response
///
/// - `200 OK` with the session cookie and `{"success": true, "user": {...}}`
/// - `400 Bad Request` for an unreadable body or empty fields
/// - `401 Unauthorized` if the IdP rejects the credentials or the returned token fails verification
/// - `503 Service Unavailable` if the IdP cannot be reached
#[instrument(skip_all, name = "auth.handlers.login")]
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!(target: "auth.handlers", error = %e, "Unreadable login body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let password = request
        .password
        .filter(|p| !p.expose_secret().is_empty())
        .filter(|_| !request.username.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username and password are required".to_string()))?;

    let access_token = state
        .idp_client
        .password_grant(&request.username, &password)
        .await?;

    let identity = state
        .verifier
        .parse_and_validate_token(access_token.expose_secret())
        .await
        .map_err(|e| {
            tracing::warn!(
                target: "auth.handlers",
                kind = e.kind(),
                error = %e,
                "IdP-issued token failed verification"
            );
            ApiError::InvalidCredentials
        })?;

    let cookie = session_cookie(
        &state.config.cookie_name,
        access_token.expose_secret(),
        state.config.cookie_max_age_seconds,
    );
    let cookie = HeaderValue::from_str(&cookie).map_err(|_| {
        tracing::error!(target: "auth.handlers", "Access token not representable as cookie");
        ApiError::Internal
    })?;

    tracing::info!(target: "auth.handlers", role = %identity.role, "Login succeeded");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: identity,
        }),
    )
        .into_response())
}

/// Handler for POST /logout
///
/// Always succeeds; clears the session cookie.
#[instrument(skip_all, name = "auth.handlers.logout")]
pub async fn logout(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let cookie = HeaderValue::from_str(&expired_cookie(&state.config.cookie_name))
        .map_err(|_| ApiError::Internal)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
        .into_response())
}
