//! Common utilities and types shared across Gokusan components.

#![warn(clippy::pedantic)]

/// Module for the verified identity and its header contract
pub mod identity;

/// Module for unverified token header inspection
pub mod jwt;

/// Module for secret types that prevent accidental logging
pub mod secret;
