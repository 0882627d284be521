//! File service error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::identity::IdentityHeaderError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    /// Identity headers absent or unusable.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] IdentityHeaderError),
}

impl IntoResponse for FileError {
    fn into_response(self) -> Response {
        match self {
            FileError::Unauthorized(reason) => {
                tracing::info!(target: "file.handlers", reason = %reason, "Rejected request without identity");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Unauthorized"})),
                )
                    .into_response()
            }
        }
    }
}
