//! Token claims issued by the auth service.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Role carried in the `role` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Student,
    Teacher,
    User,
    /// Any role the gateway does not know about; passed through as-is.
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::Student => "STUDENT",
            Role::Teacher => "TEACHER",
            Role::User => "USER",
            Role::Other(raw) => raw,
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "STUDENT" => Role::Student,
            "TEACHER" => Role::Teacher,
            "USER" => Role::User,
            _ => Role::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from(raw.as_str()))
    }
}

/// Verified identity extracted from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username or user id).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    pub role: Role,
}

impl Claims {
    /// Claims are only valid while `now < exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}
