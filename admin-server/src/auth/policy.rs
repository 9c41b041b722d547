//! Policy Table
//!
//! Role ranks and per-role default permission sets.
//!
//! ## Rules
//! - Higher rank means more authority; unknown roles rank 0
//! - Permission names are `<module>.<action>`
//! - Only the five built-in roles carry default permissions
//! - The table is immutable once built and shared through `Arc`

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROLE_SUPER_ADMIN: &str = "super-admin";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_EMPLOYEE: &str = "employee";
pub const ROLE_USER: &str = "user";
pub const ROLE_GUEST: &str = "guest";

/// `access_level` value that bypasses every permission check
pub const SUPER_ACCESS_LEVEL: &str = "super";

/// Built-in role ranks
pub const ROLE_HIERARCHY: &[(&str, u32)] = &[
    (ROLE_SUPER_ADMIN, 100),
    (ROLE_ADMIN, 80),
    (ROLE_MANAGER, 60),
    (ROLE_EMPLOYEE, 40),
    (ROLE_USER, 20),
    (ROLE_GUEST, 10),
];

/// Admin 默认权限 (全部业务模块的增删改查)
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &[
    // 用户
    "user.create",
    "user.read",
    "user.update",
    "user.delete",
    // 商品 / 分类
    "product.create",
    "product.read",
    "product.update",
    "product.delete",
    "category.create",
    "category.read",
    "category.update",
    "category.delete",
    // 订单 / POS
    "order.create",
    "order.read",
    "order.update",
    "order.delete",
    "pos.create",
    "pos.read",
    "pos.update",
    "pos.delete",
    // 折扣 / 发票 / 客户
    "discount.create",
    "discount.read",
    "discount.update",
    "discount.delete",
    "invoice.create",
    "invoice.read",
    "invoice.update",
    "invoice.delete",
    "customer.create",
    "customer.read",
    "customer.update",
    "customer.delete",
    // 工单
    "support.create",
    "support.read",
    "support.update",
    "support.delete",
    // 只读系统模块
    "role.read",
    "settings.read",
    "analytics.read",
];

/// Super-admin 专属权限 (在 admin 权限之上)
pub const SUPER_ADMIN_ONLY_PERMISSIONS: &[&str] = &[
    "role.create",
    "role.update",
    "role.delete",
    "settings.update",
    "system.backup",
    "system.restore",
    "system.logs",
];

pub const DEFAULT_MANAGER_PERMISSIONS: &[&str] = &[
    "product.create",
    "product.read",
    "product.update",
    "category.create",
    "category.read",
    "category.update",
    "order.read",
    "order.update",
    "pos.create",
    "pos.read",
    "pos.update",
    "discount.create",
    "discount.read",
    "discount.update",
    "invoice.create",
    "invoice.read",
    "customer.read",
    "customer.update",
    "support.read",
    "support.update",
    "analytics.read",
];

pub const DEFAULT_EMPLOYEE_PERMISSIONS: &[&str] = &[
    "product.read",
    "category.read",
    "order.create",
    "order.read",
    "order.update",
    "pos.create",
    "pos.read",
    "pos.update",
    "customer.read",
    "support.create",
    "support.read",
];

pub const DEFAULT_USER_PERMISSIONS: &[&str] = &[
    "product.read",
    "category.read",
    "order.create",
    "order.read",
    "support.create",
    "support.read",
];

/// Policy loading errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed policy table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Policy table must rank the '{0}' role")]
    MissingRole(&'static str),
}

/// Role hierarchy plus default permission sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    pub role_hierarchy: HashMap<String, u32>,
    #[serde(default)]
    pub default_permissions: HashMap<String, BTreeSet<String>>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let role_hierarchy = ROLE_HIERARCHY
            .iter()
            .map(|(role, rank)| (role.to_string(), *rank))
            .collect();

        let super_admin = DEFAULT_ADMIN_PERMISSIONS
            .iter()
            .chain(SUPER_ADMIN_ONLY_PERMISSIONS);

        let default_permissions = HashMap::from([
            (ROLE_SUPER_ADMIN.to_string(), to_set(super_admin)),
            (ROLE_ADMIN.to_string(), to_set(DEFAULT_ADMIN_PERMISSIONS)),
            (ROLE_MANAGER.to_string(), to_set(DEFAULT_MANAGER_PERMISSIONS)),
            (ROLE_EMPLOYEE.to_string(), to_set(DEFAULT_EMPLOYEE_PERMISSIONS)),
            (ROLE_USER.to_string(), to_set(DEFAULT_USER_PERMISSIONS)),
        ]);

        Self {
            role_hierarchy,
            default_permissions,
        }
    }
}

fn to_set<'a>(permissions: impl IntoIterator<Item = &'a &'a str>) -> BTreeSet<String> {
    permissions.into_iter().map(|p| p.to_string()).collect()
}

impl PolicyTable {
    /// Parse a table from JSON
    ///
    /// ```json
    /// { "role_hierarchy": { "admin": 80 }, "default_permissions": { "admin": ["order.read"] } }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        if !self.role_hierarchy.contains_key(ROLE_ADMIN) {
            return Err(PolicyError::MissingRole(ROLE_ADMIN));
        }
        Ok(())
    }

    /// Rank of a role name (0 when absent or unknown)
    pub fn rank(&self, role: Option<&str>) -> u32 {
        role.and_then(|r| self.role_hierarchy.get(r))
            .copied()
            .unwrap_or(0)
    }

    /// Rank of the admin role, the threshold for the admin blanket check
    pub fn admin_rank(&self) -> u32 {
        self.rank(Some(ROLE_ADMIN))
    }

    /// Whether the role's default set contains `permission`
    pub fn grants_by_default(&self, role: Option<&str>, permission: &str) -> bool {
        role.and_then(|r| self.default_permissions.get(r))
            .is_some_and(|set| set.contains(permission))
    }

    /// Default permissions of a role, sorted (empty when the role has none)
    pub fn default_permissions_for(&self, role: Option<&str>) -> Vec<String> {
        role.and_then(|r| self.default_permissions.get(r))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ranks() {
        let table = PolicyTable::default();
        assert_eq!(table.rank(Some("super-admin")), 100);
        assert_eq!(table.rank(Some("admin")), 80);
        assert_eq!(table.rank(Some("manager")), 60);
        assert_eq!(table.rank(Some("employee")), 40);
        assert_eq!(table.rank(Some("user")), 20);
        assert_eq!(table.rank(Some("guest")), 10);
        assert_eq!(table.rank(Some("cashier")), 0);
        assert_eq!(table.rank(None), 0);
        assert_eq!(table.admin_rank(), 80);
    }

    #[test]
    fn test_builtin_default_sets() {
        let table = PolicyTable::default();
        assert!(table.grants_by_default(Some("admin"), "user.delete"));
        assert!(!table.grants_by_default(Some("admin"), "system.backup"));
        assert!(table.grants_by_default(Some("super-admin"), "system.backup"));
        assert!(table.grants_by_default(Some("super-admin"), "user.delete"));
        assert!(table.grants_by_default(Some("employee"), "order.create"));
        assert!(table.grants_by_default(Some("employee"), "pos.update"));
        assert!(!table.grants_by_default(Some("employee"), "invoice.update"));
        assert!(!table.grants_by_default(Some("employee"), "product.delete"));
        assert!(table.grants_by_default(Some("user"), "product.read"));
        // guest is ranked but has no default set
        assert!(!table.grants_by_default(Some("guest"), "product.read"));
        assert!(!table.grants_by_default(None, "product.read"));
    }

    #[test]
    fn test_only_five_roles_have_defaults() {
        let table = PolicyTable::default();
        let mut roles: Vec<_> = table.default_permissions.keys().cloned().collect();
        roles.sort();
        assert_eq!(
            roles,
            vec!["admin", "employee", "manager", "super-admin", "user"]
        );
        assert!(table.default_permissions_for(Some("guest")).is_empty());
    }

    #[test]
    fn test_default_permissions_for_is_sorted() {
        let table = PolicyTable::default();
        let perms = table.default_permissions_for(Some("user"));
        let mut sorted = perms.clone();
        sorted.sort();
        assert_eq!(perms, sorted);
        assert_eq!(perms.len(), DEFAULT_USER_PERMISSIONS.len());
    }

    #[test]
    fn test_from_json_str() {
        let table = PolicyTable::from_json_str(
            r#"{
                "role_hierarchy": {"admin": 80, "auditor": 50},
                "default_permissions": {"auditor": ["analytics.read", "order.read"]}
            }"#,
        )
        .unwrap();
        assert_eq!(table.rank(Some("auditor")), 50);
        assert!(table.grants_by_default(Some("auditor"), "order.read"));
        assert!(!table.grants_by_default(Some("admin"), "order.read"));
    }

    #[test]
    fn test_from_json_requires_admin_rank() {
        let err = PolicyTable::from_json_str(r#"{"role_hierarchy": {"user": 20}}"#).unwrap_err();
        assert!(matches!(err, PolicyError::MissingRole("admin")));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = PolicyTable::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, serde_json::to_string(&PolicyTable::default()).unwrap()).unwrap();

        let loaded = PolicyTable::from_json_file(&path).unwrap();
        assert_eq!(loaded, PolicyTable::default());

        let missing = PolicyTable::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(PolicyError::Io { .. })));
    }
}
