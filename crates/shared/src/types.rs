//! Common types used across Gatehouse

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// =============================================================================
// Roles
// =============================================================================

/// Access role carried in credential tokens.
///
/// Roles form a closed set with no hierarchy: an `Admin` does not satisfy a
/// `User` requirement, and the reverse is also false. Comparison is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Identities
// =============================================================================

/// The fields a credential token is issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            role,
        }
    }
}

/// A verified identity, produced only by successful token verification.
/// Lives for one request and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::timestamp")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl Identity {
    /// Exact role match
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

// =============================================================================
// Users
// =============================================================================

/// A user account as held by the user store
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserRecord {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.email.clone(), self.role)
    }
}

/// User data returned over the API (never includes the password hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
