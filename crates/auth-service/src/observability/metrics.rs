//! Metrics definitions for the auth service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: `success` plus the five `AuthError::kind()` values
//! - `status`: `success`, `error`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called once per process, before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Cache hits are sub-millisecond; cold paths include a key-set fetch
        .set_buckets_for_metric(
            Matcher::Prefix("auth_token_validation".to_string()),
            &[
                0.0005, 0.001, 0.0025, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record one token verification attempt.
///
/// Metric: `auth_token_validations_total`, `auth_token_validation_duration_seconds`
/// Labels: `outcome`
pub fn record_token_validation(outcome: &'static str, duration: Duration) {
    histogram!("auth_token_validation_duration_seconds", "outcome" => outcome)
        .record(duration.as_secs_f64());

    counter!("auth_token_validations_total", "outcome" => outcome).increment(1);
}

/// Record one upstream key-set fetch.
///
/// Metric: `auth_jwks_refreshes_total`
/// Labels: `status`
pub fn record_jwks_refresh(status: &'static str) {
    counter!("auth_jwks_refreshes_total", "status" => status).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these are no-ops; the tests only check
    // that recording never panics.

    #[test]
    fn test_record_token_validation() {
        record_token_validation("success", Duration::from_micros(300));
        record_token_validation("token_invalid", Duration::from_millis(2));
        record_token_validation("fetch_failed", Duration::from_millis(150));
    }

    #[test]
    fn test_record_jwks_refresh() {
        record_jwks_refresh("success");
        record_jwks_refresh("error");
    }
}
