//! Role Model

use serde::{Deserialize, Serialize};

use super::principal::PermissionEntry;

/// Role as returned by the back-office store, with its permission grants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

impl RoleRecord {
    pub fn new<I, P>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionEntry>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Bare permission names, in store order
    pub fn permission_names(&self) -> Vec<String> {
        self.permissions
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }
}

/// Principal row looked up by `(user_type, id)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrincipalRecord {
    /// Assigned role; `None` when the principal has no role
    #[serde(default)]
    pub role: Option<RoleRecord>,
}

impl PrincipalRecord {
    pub fn with_role(role: RoleRecord) -> Self {
        Self { role: Some(role) }
    }
}
