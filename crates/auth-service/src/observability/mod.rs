//! Observability module for the auth service.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
