//! Token verification core: key cache, claims and verifier.

pub mod claims;
pub mod jwks;
pub mod verifier;

pub use claims::Claims;
pub use jwks::{JwksClient, RsaPublicKey};
pub use verifier::TokenVerifier;
