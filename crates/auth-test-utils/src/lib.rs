//! # Auth Test Utilities
//!
//! Shared test utilities for the auth service.
//!
//! This crate provides:
//! - Deterministic RSA keypairs and key-set bodies (`crypto_fixtures`)
//! - Signed access token builder (`token_builders`)
//! - Mock identity provider serving key-set and token endpoints (`idp_server`)
//! - Server test harness (`TestAuthServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let key = TestKeyPair::primary("abc");
//!     let idp = MockIdpServer::start().await;
//!     idp.mount_keys(&[&key]).await;
//!
//!     let server = TestAuthServer::spawn(&idp).await?;
//!     let token = TestTokenBuilder::new()
//!         .issuer(&idp.issuer())
//!         .preferred_username("alice")
//!         .sign(&key);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/validate", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod idp_server;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use idp_server::*;
pub use server_harness::*;
pub use token_builders::*;
