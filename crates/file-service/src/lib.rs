//! File Service Library
//!
//! Upload and download endpoints that sit behind the gateway. Every request
//! reaching this service has already been validated by the auth service; the
//! caller's identity arrives as the `x-user-name` / `x-user-role` headers and is
//! trusted as-is.
//!
//! # Security
//!
//! The identity headers are only trustworthy when this service is reachable
//! exclusively through the gateway. A direct caller can set them freely.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;
