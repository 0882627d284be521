//! Auth Service Library
//!
//! Gateway-facing authentication check for Gokusan. Verifies bearer tokens
//! issued by the realm's identity provider and converts them into a
//! coarse-grained identity (name + role) that downstream services trust via
//! headers.
//!
//! # Modules
//!
//! - `auth` - Key cache, claims and token verifier
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Identity provider client

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod routes;
pub mod services;
