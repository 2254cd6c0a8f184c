use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Identity decoded from a verified bearer token. The role is the raw claim
/// and may be a generic placeholder such as "authenticated".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

// ==============================================================================
// APPLICATION ROLES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Client,
    Veterinarian,
    Admin,
    /// A claim that could not be mapped to an application role.
    Unrecognized(String),
}

impl Role {
    /// Maps a stored or claimed role string; anything outside the three
    /// application roles is kept verbatim as `Unrecognized`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "client" => Role::Client,
            "veterinarian" => Role::Veterinarian,
            "admin" => Role::Admin,
            other => Role::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Client => "client",
            Role::Veterinarian => "veterinarian",
            Role::Admin => "admin",
            Role::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Role::Unrecognized(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The authenticated caller with a resolved role, passed explicitly to services.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, email: Option<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }

    pub fn is_veterinarian(&self) -> bool {
        self.role == Role::Veterinarian
    }
}
