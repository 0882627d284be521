//! Gateway forward-auth handler.
//!
//! The gateway calls this endpoint for every protected request, forwarding the
//! caller's `Authorization` and `Cookie` headers. A `200` carries the verified
//! identity as `x-user-name` / `x-user-role` headers, which the gateway copies
//! onto the upstream request. Any failure is an opaque `401`.

use crate::errors::AuthError;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

/// Token from `Authorization: Bearer`, falling back to the session cookie.
pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| cookie_value(headers, cookie_name))
}

/// Value of the named cookie across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Handler for GET /validate (and the /kong-validate alias).
///
/// # Response
///
/// - `200 OK` with `x-user-name` and `x-user-role` headers
/// - `401 Unauthorized` for a missing, malformed or rejected token
#[instrument(skip_all, name = "auth.handlers.validate")]
pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let token = extract_token(&headers, &state.config.cookie_name).ok_or_else(|| {
        tracing::debug!(target: "auth.handlers", "No bearer token or session cookie");
        AuthError::TokenMalformed("no credentials presented".to_string())
    })?;

    let identity = state.verifier.parse_and_validate_token(token).await?;

    let mut response = StatusCode::OK.into_response();
    for (name, value) in identity.header_pairs() {
        // Raw bytes so non-ASCII names survive; control characters do not
        let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| {
            tracing::warn!(target: "auth.handlers", header = name, "Identity not representable as header");
            AuthError::ClaimsMissing
        })?;
        response.headers_mut().insert(name, value);
    }

    tracing::debug!(target: "auth.handlers", role = %identity.role, "Gateway validation succeeded");
    Ok(response)
}
