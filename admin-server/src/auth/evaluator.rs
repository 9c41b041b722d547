//! Authorization Evaluator
//!
//! Decides whether a [`Principal`] holds a permission or meets a role rank.
//!
//! # Permission resolution order
//!
//! First match wins:
//!
//! 1. `is_super_admin`, or `access_level == "super"` → allow
//! 2. Resolve the role name: `role`, then `access_level`, then `user_type`
//! 3. Rank at or above `admin` and the permission is in the admin default
//!    set → allow (otherwise fall through)
//! 4. Explicit `permissions` present → membership decides, even when empty
//! 5. Otherwise → membership in the role's default set
//!
//! All checks are pure functions over the principal and the immutable
//! [`PolicyTable`]; the evaluator is cheap to clone and safe to share.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::models::Principal;

use super::policy::{PolicyTable, ROLE_ADMIN, SUPER_ACCESS_LEVEL};

/// What a gate requires of the principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Permission(String),
    #[serde(alias = "any")]
    AnyOf(Vec<String>),
    #[serde(alias = "all")]
    AllOf(Vec<String>),
    Role(String),
}

impl Requirement {
    pub fn permission(name: impl Into<String>) -> Self {
        Self::Permission(name.into())
    }

    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(names.into_iter().map(Into::into).collect())
    }

    pub fn all_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllOf(names.into_iter().map(Into::into).collect())
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permission(p) => write!(f, "{p}"),
            Self::AnyOf(ps) => write!(f, "any of: {}", ps.join(", ")),
            Self::AllOf(ps) => write!(f, "all of: {}", ps.join(", ")),
            Self::Role(r) => write!(f, "role {r}"),
        }
    }
}

/// Outcome of a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    /// Denied, with the requirement that was not met
    Deny(Requirement),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Stateless permission / role evaluator over a shared policy table
#[derive(Debug, Clone, Default)]
pub struct AuthorizationEvaluator {
    policy: Arc<PolicyTable>,
}

impl AuthorizationEvaluator {
    pub fn new(policy: Arc<PolicyTable>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Rank of the principal's effective role (0 when unranked)
    pub fn role_level(&self, principal: &Principal) -> u32 {
        self.policy.rank(principal.effective_role())
    }

    /// Check a single permission
    pub fn has_permission(&self, principal: &Principal, permission: &str) -> bool {
        if is_super(principal) {
            return true;
        }

        let user_role = principal.effective_role();
        let user_level = self.policy.rank(user_role);

        // admin 及以上: 只放行 admin 默认集合内的权限
        if user_level >= self.policy.admin_rank()
            && self.policy.grants_by_default(Some(ROLE_ADMIN), permission)
        {
            return true;
        }

        if let Some(granted) = principal.explicitly_grants(permission) {
            return granted;
        }

        self.policy.grants_by_default(user_role, permission)
    }

    /// True if at least one permission is held (false for an empty list)
    pub fn has_any_permission<S: AsRef<str>>(
        &self,
        principal: &Principal,
        permissions: &[S],
    ) -> bool {
        permissions
            .iter()
            .any(|p| self.has_permission(principal, p.as_ref()))
    }

    /// True if every permission is held (true for an empty list)
    pub fn has_all_permissions<S: AsRef<str>>(
        &self,
        principal: &Principal,
        permissions: &[S],
    ) -> bool {
        permissions
            .iter()
            .all(|p| self.has_permission(principal, p.as_ref()))
    }

    /// True if the principal's rank is at least `min_role`'s rank
    ///
    /// Unknown names rank 0 on both sides, so two unranked names compare equal.
    pub fn meets_role(&self, principal: &Principal, min_role: &str) -> bool {
        self.role_level(principal) >= self.policy.rank(Some(min_role))
    }

    /// Evaluate a requirement into a verdict
    pub fn check(&self, principal: &Principal, requirement: &Requirement) -> Verdict {
        let allowed = match requirement {
            Requirement::Permission(p) => self.has_permission(principal, p),
            Requirement::AnyOf(ps) => self.has_any_permission(principal, ps.as_slice()),
            Requirement::AllOf(ps) => self.has_all_permissions(principal, ps.as_slice()),
            Requirement::Role(r) => self.meets_role(principal, r),
        };

        if allowed {
            Verdict::Allow
        } else {
            Verdict::Deny(requirement.clone())
        }
    }
}

/// Super-admin flag or `access_level == "super"`: bypasses every check
pub fn is_super(principal: &Principal) -> bool {
    principal.is_super_admin || principal.access_level.as_deref() == Some(SUPER_ACCESS_LEVEL)
}
