//! Service layer for the auth service.
//!
//! # Components
//!
//! - `idp_client` - Password-grant forward to the identity provider

pub mod idp_client;

pub use idp_client::IdpClient;
