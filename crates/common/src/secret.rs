//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] so services share one vocabulary for passwords and
//! bearer tokens. `SecretString` implements `Debug` with redaction, so a struct
//! that derives `Debug` around a secret is safe to log, and the value is zeroized
//! on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginForm {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let form = LoginForm {
//!     username: "alice".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{form:?}").contains("hunter2"));
//! assert_eq!(form.password.expose_secret(), "hunter2");
//! ```
//!
//! Use `SecretString` for user passwords forwarded to the identity provider and
//! for access tokens held outside of a cookie header.

pub use secrecy::{ExposeSecret, SecretString};
