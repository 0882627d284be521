//! File service configuration.

use std::collections::HashMap;
use std::env;

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:6565";

/// File service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub bind_address: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        Self {
            bind_address: vars
                .get("BIND_ADDRESS")
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        }
    }
}
