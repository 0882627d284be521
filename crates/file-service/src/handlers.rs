//! HTTP request handlers for the file service.

use crate::errors::FileError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    Json,
};
use common::identity::Identity;
use serde_json::{json, Value};
use tracing::instrument;

/// Identity the gateway attached to the request.
///
/// Rejects with `401 {"error": "Unauthorized"}` when either header is missing.
#[derive(Debug, Clone)]
pub struct GatewayIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for GatewayIdentity
where
    S: Send + Sync,
{
    type Rejection = FileError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Identity::from_headers(&parts.headers)?))
    }
}

/// Handler for GET /upload
#[instrument(skip_all, name = "file.handlers.upload")]
pub async fn upload(GatewayIdentity(identity): GatewayIdentity) -> String {
    tracing::info!(target: "file.handlers", role = %identity.role, "Upload accepted");
    format!(
        "Upload successful! Welcome {} (role: {})",
        identity.name, identity.role
    )
}

/// Handler for GET /download
#[instrument(skip_all, name = "file.handlers.download")]
pub async fn download(GatewayIdentity(identity): GatewayIdentity) -> String {
    tracing::info!(target: "file.handlers", role = %identity.role, "Download accepted");
    format!(
        "Download successful! Welcome {} (role: {})",
        identity.name, identity.role
    )
}

/// Handler for GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}
