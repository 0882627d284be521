//! Key-set client for fetching and caching the identity provider's RSA signing keys.
//!
//! The client fetches the realm's JSON Web Key Set on demand and caches the
//! decoded RSA public keys by key ID for a configurable TTL. There is no
//! background refresh task.
//!
//! # Consistency
//!
//! - The key map is published as one immutable snapshot behind an `Arc`.
//!   A refresh builds a complete new map off to the side and swaps the pointer,
//!   so readers see the old set or the new set, never a mix.
//! - Refreshes are serialised by a mutex and re-check freshness once inside it,
//!   so N concurrent callers on a cold or expired cache cause one fetch.
//! - A failed fetch leaves the snapshot and its timestamp untouched. The next
//!   lookup retries immediately; there is no negative caching.
//!
//! # Known gaps
//!
//! - No fetch timeout beyond the HTTP client's defaults. A hanging key-set
//!   endpoint stalls every caller queued on the refresh mutex.
//! - No backoff on repeated failures. Under a sustained outage every lookup
//!   past the TTL re-attempts the fetch.

use crate::errors::AuthError;
use crate::observability::metrics;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// One entry of the key-set response. Only lives for a fetch/parse cycle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Jwk {
    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: String,

    /// Key type (must be "RSA" for signing keys we accept).
    #[serde(default)]
    pub kty: String,

    /// Key use (must be "sig").
    #[serde(default, rename = "use")]
    pub key_use: String,

    /// Algorithm hint (e.g. "RS256"). Informational only.
    #[serde(default)]
    pub alg: String,

    /// Modulus, base64url-encoded big-endian integer.
    #[serde(default)]
    pub n: String,

    /// Exponent, base64url-encoded big-endian integer.
    #[serde(default)]
    pub e: String,
}

impl Jwk {
    /// True for entries that are RSA signing keys.
    pub fn is_rsa_signing_key(&self) -> bool {
        self.kty == "RSA" && self.key_use == "sig"
    }
}

/// Key-set response body.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Why a single key-set entry could not be turned into a public key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyDecodeError {
    #[error("failed to decode modulus: {0}")]
    Modulus(String),

    #[error("failed to decode exponent: {0}")]
    Exponent(String),
}

/// RSA public key: modulus and exponent as big-endian unsigned integers.
///
/// Immutable once built from a key-set entry.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    modulus: Vec<u8>,
    exponent: Vec<u8>,
}

impl RsaPublicKey {
    /// Build from raw big-endian components.
    pub fn from_components(modulus: Vec<u8>, exponent: Vec<u8>) -> Self {
        Self { modulus, exponent }
    }

    /// Decode the base64url `n` and `e` fields of a key-set entry.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeyDecodeError> {
        let modulus = decode_component(&jwk.n).map_err(KeyDecodeError::Modulus)?;
        let exponent = decode_component(&jwk.e).map_err(KeyDecodeError::Exponent)?;
        Ok(Self { modulus, exponent })
    }

    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    /// Verification key for `jsonwebtoken`.
    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_rsa_raw_components(&self.modulus, &self.exponent)
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("modulus_bits", &(self.modulus.len() * 8))
            .field("exponent", &self.exponent)
            .finish()
    }
}

fn decode_component(value: &str) -> Result<Vec<u8>, String> {
    // Some providers pad; the encoding is otherwise unpadded base64url
    let bytes = URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|e| e.to_string())?;
    if bytes.is_empty() {
        return Err("empty value".to_string());
    }
    Ok(bytes)
}

/// Turn a key-set response into a key map.
///
/// Non-RSA and non-signing entries are ignored. Entries that fail to decode are
/// skipped with a warning; they never fail the whole set.
pub fn parse_key_set(jwks: JwksResponse) -> HashMap<String, RsaPublicKey> {
    let mut keys = HashMap::with_capacity(jwks.keys.len());

    for jwk in jwks.keys {
        if !jwk.is_rsa_signing_key() {
            tracing::debug!(
                target: "auth.jwks",
                kid = %jwk.kid,
                kty = %jwk.kty,
                key_use = %jwk.key_use,
                "Skipping non-RSA-signing key"
            );
            continue;
        }
        if jwk.kid.is_empty() {
            tracing::warn!(target: "auth.jwks", "Skipping RSA key without kid");
            continue;
        }

        match RsaPublicKey::from_jwk(&jwk) {
            Ok(key) => {
                keys.insert(jwk.kid, key);
            }
            Err(e) => {
                tracing::warn!(target: "auth.jwks", kid = %jwk.kid, error = %e, "Failed to parse RSA key");
            }
        }
    }

    keys
}

/// One published version of the key map.
#[derive(Debug, Default)]
struct KeySnapshot {
    /// Map of key ID to public key.
    keys: HashMap<String, RsaPublicKey>,

    /// Last successful fetch. `None` until the first one.
    fetched_at: Option<Instant>,
}

impl KeySnapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < ttl)
    }
}

/// Key-set client for fetching and caching public keys.
///
/// Construct once per process and share via `Arc` with every verification
/// call site.
pub struct JwksClient {
    /// URL to the key-set endpoint.
    jwks_url: String,

    /// HTTP client for fetching the key set.
    http_client: reqwest::Client,

    /// How long a fetched key set is trusted.
    cache_ttl: Duration,

    /// Currently published key map. The lock is held only to clone or swap the `Arc`.
    snapshot: RwLock<Arc<KeySnapshot>>,

    /// Serialises refreshes.
    refresh_lock: Mutex<()>,
}

impl JwksClient {
    /// Create a new key-set client with the default TTL.
    pub fn new(jwks_url: String) -> Self {
        Self::with_ttl(jwks_url, Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS))
    }

    /// Create a new key-set client with custom cache TTL.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the realm's key-set endpoint
    /// * `cache_ttl` - How long to cache the key set before refreshing
    pub fn with_ttl(jwks_url: String, cache_ttl: Duration) -> Self {
        Self {
            jwks_url,
            http_client: reqwest::Client::new(),
            cache_ttl,
            snapshot: RwLock::new(Arc::new(KeySnapshot::default())),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    async fn current(&self) -> Arc<KeySnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Get the public key for a key ID.
    ///
    /// Returns the cached key without network access while the cache is fresh,
    /// otherwise refreshes the key set first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::FetchFailed` if a needed refresh fails.
    /// Returns `AuthError::KeyNotFound` if the (fresh) key set has no such key.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<RsaPublicKey, AuthError> {
        {
            let snapshot = self.current().await;
            if snapshot.is_fresh(self.cache_ttl) {
                if let Some(key) = snapshot.keys.get(kid) {
                    tracing::debug!(target: "auth.jwks", kid = %kid, "JWKS cache hit");
                    return Ok(key.clone());
                }
            }
        }

        self.refresh().await?;

        if let Some(key) = self.current().await.keys.get(kid) {
            return Ok(key.clone());
        }

        // Legitimate after rotation: an old-kid token arrives
        tracing::warn!(target: "auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
        Err(AuthError::KeyNotFound(kid.to_string()))
    }

    /// Refresh if stale, letting one caller fetch while the rest wait.
    #[instrument(skip(self))]
    async fn refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if self.current().await.is_fresh(self.cache_ttl) {
            tracing::debug!(target: "auth.jwks", "JWKS already refreshed by concurrent caller");
            return Ok(());
        }

        self.fetch_and_publish().await
    }

    /// Fetch and publish a new key set regardless of freshness.
    ///
    /// Still serialised with demand-driven refreshes.
    pub async fn force_refresh(&self) -> Result<(), AuthError> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_publish().await
    }

    async fn fetch_and_publish(&self) -> Result<(), AuthError> {
        let keys = match self.fetch_keys().await {
            Ok(keys) => {
                metrics::record_jwks_refresh("success");
                keys
            }
            Err(e) => {
                metrics::record_jwks_refresh("error");
                return Err(e);
            }
        };

        let key_count = keys.len();
        let next = Arc::new(KeySnapshot {
            keys,
            fetched_at: Some(Instant::now()),
        });
        *self.snapshot.write().await = next;

        tracing::info!(target: "auth.jwks", key_count, "JWKS cache refreshed");
        Ok(())
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, RsaPublicKey>, AuthError> {
        tracing::debug!(target: "auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "auth.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::FetchFailed(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(target: "auth.jwks", status = %status, "JWKS endpoint returned error");
            return Err(AuthError::FetchFailed(format!(
                "endpoint returned status {}",
                status.as_u16()
            )));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::FetchFailed(format!("malformed body: {e}"))
        })?;

        Ok(parse_key_set(jwks))
    }

    /// Key from the current snapshot, ignoring freshness and without network access.
    ///
    /// Keys from the last successful fetch stay here across failed refreshes.
    pub async fn cached_key(&self, kid: &str) -> Option<RsaPublicKey> {
        self.current().await.keys.get(kid).cloned()
    }

    /// Number of keys in the current snapshot.
    pub async fn cached_key_count(&self) -> usize {
        self.current().await.keys.len()
    }

    /// Whether the current snapshot is within its TTL.
    pub async fn is_fresh(&self) -> bool {
        self.current().await.is_fresh(self.cache_ttl)
    }
}
