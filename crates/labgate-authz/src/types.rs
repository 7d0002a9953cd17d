//! Identity types carried inside session tokens.
//!
//! # Purpose
//! Gives the subject identifier, role, and token kind closed, typed shapes so
//! that a typo in a role or kind string cannot silently widen or narrow access.
//!
//! # Key invariants
//! - `Role` and `TokenKind` parse only from their wire names; anything else is
//!   an error, never a default.
//! - `SubjectId` preserves its inner string exactly.
//!
//! # Examples
//! ```rust
//! use labgate_authz::{Role, TokenKind};
//!
//! let role: Role = "DOCTOR".parse().expect("role");
//! assert_eq!(role, Role::Doctor);
//! assert_eq!(TokenKind::Refresh.as_str(), "refresh");
//! ```
use crate::errors::AuthzError;
use crate::permission::Permission;
use crate::table;
use serde::{Deserialize, Serialize};

/// Opaque identifier of the authenticated subject (a user id).
///
/// # Example
/// ```rust
/// use labgate_authz::SubjectId;
///
/// let subject = SubjectId::new("user-42");
/// assert_eq!(subject.as_str(), "user-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Doctor,
    Analyst,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Doctor, Role::Analyst, Role::Viewer];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Analyst => "ANALYST",
            Role::Viewer => "VIEWER",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Shorthand for [`table::role_has`].
    pub fn has_permission(self, permission: Permission) -> bool {
        table::role_has(self, permission)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADMIN" => Ok(Role::Admin),
            "DOCTOR" => Ok(Role::Doctor),
            "ANALYST" => Ok(Role::Analyst),
            "VIEWER" => Ok(Role::Viewer),
            other => Err(AuthzError::UnknownRole(other.to_string())),
        }
    }
}

/// Purpose a session token was minted for.
///
/// Access tokens authorize API calls; refresh tokens only mint new access
/// tokens. A token of one kind never passes validation as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenKind {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            other => Err(AuthzError::UnknownTokenKind(other.to_string())),
        }
    }
}
