//! Principal Model
//!
//! The authenticated actor a request is authorized for. Principals come
//! from token claims or from the back-office store and are read-only inputs
//! to every permission check.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Principal identifier (integer primary key or opaque string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrincipalId {
    Int(i64),
    Str(String),
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for PrincipalId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for PrincipalId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Which collection owns the principal record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Employee,
    User,
}

impl UserType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::User => "user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permission grant: either a bare name or a `{ "name": ... }` record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionEntry {
    Bare(String),
    Named { name: String },
}

impl PermissionEntry {
    /// Permission name regardless of entry shape
    pub fn name(&self) -> &str {
        match self {
            Self::Bare(name) | Self::Named { name } => name.as_str(),
        }
    }
}

impl From<&str> for PermissionEntry {
    fn from(name: &str) -> Self {
        Self::Bare(name.to_string())
    }
}

impl From<String> for PermissionEntry {
    fn from(name: String) -> Self {
        Self::Bare(name)
    }
}

/// Authenticated principal
///
/// `permissions: None` and `permissions: Some(vec![])` are different states:
/// an explicit list, even an empty one, replaces the role's default grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionEntry>>,
}

impl Principal {
    pub fn new(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            user_type: None,
            role: None,
            access_level: None,
            is_super_admin: false,
            permissions: None,
        }
    }

    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_access_level(mut self, access_level: impl Into<String>) -> Self {
        self.access_level = Some(access_level.into());
        self
    }

    pub fn with_super_admin(mut self, is_super_admin: bool) -> Self {
        self.is_super_admin = is_super_admin;
        self
    }

    /// Attach an explicit permission list (replaces any previous one)
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionEntry>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    /// Role name used for rank and default-set lookups:
    /// `role`, then `access_level`, then `user_type`.
    pub fn effective_role(&self) -> Option<&str> {
        first_non_empty([
            self.role.as_deref(),
            self.access_level.as_deref(),
            self.user_type.as_ref().map(UserType::as_str),
        ])
    }

    /// Whether an explicit permission list grants `permission`
    ///
    /// Returns `None` when the principal carries no explicit list.
    pub fn explicitly_grants(&self, permission: &str) -> Option<bool> {
        self.permissions
            .as_ref()
            .map(|entries| entries.iter().any(|p| p.name() == permission))
    }
}

/// First candidate that is present and not an empty string
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
}
