//! Identity provider client for the login forward.
//!
//! Exchanges a username and password for an access token using the OAuth2
//! resource-owner password grant. Nothing is minted here; the returned token is
//! verified like any other bearer token before it is trusted.
//!
//! # Security
//!
//! - Passwords are held in `SecretString` and never logged
//! - Timeouts prevent hanging connections
//! - IdP error bodies are logged server-side only

use crate::errors::ApiError;
use common::secret::{ExposeSecret, SecretString};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, instrument, warn};

/// Default timeout for IdP requests in seconds.
const IDP_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Token endpoint response. Only the access token is used.
#[derive(Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
}

/// HTTP client for the realm's token endpoint.
#[derive(Clone)]
pub struct IdpClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Realm token endpoint URL.
    token_endpoint: String,

    /// OAuth2 client identifier for the password grant.
    client_id: String,
}

impl IdpClient {
    /// Create a new IdP client.
    ///
    /// # Arguments
    ///
    /// * `token_endpoint` - Realm token endpoint URL
    /// * `client_id` - Public client used for the password grant (e.g. "admin-cli")
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if the HTTP client cannot be built.
    pub fn new(token_endpoint: String, client_id: String) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(IDP_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                error!(target: "auth.services.idp_client", error = %e, "Failed to build HTTP client");
                ApiError::Internal
            })?;

        Ok(Self {
            client,
            token_endpoint,
            client_id,
        })
    }

    /// Exchange credentials for an access token.
    ///
    /// # Errors
    ///
    /// - `ApiError::InvalidCredentials` if the IdP rejects the credentials (4xx)
    /// - `ApiError::ServiceUnavailable` if the IdP is unreachable or returns 5xx
    /// - `ApiError::Internal` for an unreadable success body
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn password_grant(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        let form = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", username),
            ("password", password.expose_secret()),
        ];

        let response = self
            .client
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "auth.services.idp_client", error = %e, "IdP request failed");
                ApiError::ServiceUnavailable("identity provider is unavailable".to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            let body: TokenEndpointResponse = response.json().await.map_err(|e| {
                error!(target: "auth.services.idp_client", error = %e, "Failed to parse IdP token response");
                ApiError::Internal
            })?;
            Ok(SecretString::from(body.access_token))
        } else if status.is_server_error() {
            warn!(target: "auth.services.idp_client", status = %status, "IdP returned server error");
            Err(ApiError::ServiceUnavailable(format!(
                "identity provider returned {}",
                status.as_u16()
            )))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            tracing::info!(
                target: "auth.services.idp_client",
                status = %status,
                body = %error_body,
                "IdP rejected password grant"
            );
            Err(ApiError::InvalidCredentials)
        }
    }
}
