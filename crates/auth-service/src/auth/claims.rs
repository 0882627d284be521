//! Verified token claims.
//!
//! Typed view over the payload of an access token that passed signature
//! verification. Every consumed claim is optional: an absent claim, a `null`,
//! or a value of the wrong JSON type all read as "not present". Identity claims
//! are redacted in Debug output.

use common::identity::Role;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Realm role names that grant the admin role.
const ADMIN_REALM_ROLES: [&str; 3] = ["admin", "realm-admin", "create-realm"];

/// Username that is granted admin regardless of realm roles.
const ADMIN_USERNAME: &str = "admin";

/// Claims consumed from a verified access token.
#[derive(Clone, Default, Deserialize)]
pub struct Claims {
    /// Issuer URL. Must contain the expected realm path.
    #[serde(default, deserialize_with = "lenient_string")]
    pub iss: Option<String>,

    /// Preferred username - first choice for the display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub preferred_username: Option<String>,

    /// Full name - second choice.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// Subject - last resort.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: Option<String>,

    /// Realm-level role assignments.
    #[serde(default, deserialize_with = "lenient_realm_access")]
    pub realm_access: Option<RealmAccess>,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default, deserialize_with = "lenient_i64")]
    pub exp: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, deserialize_with = "lenient_i64")]
    pub nbf: Option<i64>,
}

/// `realm_access` claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealmAccess {
    /// Role names. Non-string entries are dropped.
    pub roles: Vec<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("preferred_username", &redacted(&self.preferred_username))
            .field("name", &redacted(&self.name))
            .field("sub", &redacted(&self.sub))
            .field("realm_access", &self.realm_access)
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .finish()
    }
}

impl Claims {
    /// Display name by precedence: `preferred_username`, then `name`, then `sub`.
    ///
    /// The first claim present wins, even when it is an empty string. Returns
    /// `None` only if all three are absent.
    pub fn display_name(&self) -> Option<&str> {
        [&self.preferred_username, &self.name, &self.sub]
            .into_iter()
            .find_map(|claim| claim.as_deref())
    }

    /// Role for the resolved display name.
    pub fn derive_role(&self, name: &str) -> Role {
        // Self-reported username grants admin; kept for compatibility
        if name == ADMIN_USERNAME {
            return Role::Admin;
        }

        let has_admin_role = self.realm_access.as_ref().is_some_and(|access| {
            access
                .roles
                .iter()
                .any(|role| ADMIN_REALM_ROLES.contains(&role.as_str()))
        });

        if has_admin_role {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Whether the issuer contains the expected realm path fragment.
    pub fn issuer_matches(&self, fragment: &str) -> bool {
        self.iss.as_deref().is_some_and(|iss| iss.contains(fragment))
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64())
}

fn lenient_realm_access<'de, D>(deserializer: D) -> Result<Option<RealmAccess>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(roles) = value.get("roles").and_then(Value::as_array) else {
        return Ok(None);
    };

    let roles = roles
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    Ok(Some(RealmAccess { roles }))
}
