//! Coarse-grained identity produced by token verification.
//!
//! The auth service converts a verified token into an [`Identity`] and hands it
//! to the gateway as two plain headers. Downstream services trust those headers
//! as-is; they never see the token.

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Header carrying the verified display name.
pub const HEADER_USER_NAME: &str = "x-user-name";

/// Header carrying the derived role (`user` or `admin`).
pub const HEADER_USER_ROLE: &str = "x-user-role";

/// Authorization level derived from token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Wire representation used in headers and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityHeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(IdentityHeaderError::UnknownRole(other.to_string())),
        }
    }
}

/// Verified caller identity. Built per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub role: Role,
}

/// Why a request's identity headers could not be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityHeaderError {
    #[error("missing identity header: {0}")]
    Missing(&'static str),

    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl Identity {
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Header pairs to attach to a gateway validation response.
    #[must_use]
    pub fn header_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (HEADER_USER_NAME, self.name.as_str()),
            (HEADER_USER_ROLE, self.role.as_str()),
        ]
    }

    /// Read the identity a gateway placed on a request.
    ///
    /// Both headers must be present, non-empty and valid UTF-8. Non-ASCII names
    /// are passed through as raw UTF-8 header bytes.
    ///
    /// # Errors
    ///
    /// Returns `IdentityHeaderError::Missing` for an absent or empty header and
    /// `IdentityHeaderError::UnknownRole` for a role other than `user`/`admin`.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, IdentityHeaderError> {
        let name = header_str(headers, HEADER_USER_NAME)?;
        let role = header_str(headers, HEADER_USER_ROLE)?.parse()?;
        Ok(Self::new(name, role))
    }
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, IdentityHeaderError> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .filter(|v| !v.is_empty())
        .ok_or(IdentityHeaderError::Missing(name))
}
