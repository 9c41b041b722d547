//! SQLite permission source
//!
//! | table | columns |
//! |-------|---------|
//! | admins / employees / users | `id`, `role_id` |
//! | roles | `id`, `name` |
//! | permissions | `id`, `name` |
//! | role_permissions | `role_id`, `permission_id` |

use async_trait::async_trait;
use shared::models::{PrincipalId, PrincipalRecord, RoleRecord, UserType};
use sqlx::SqlitePool;

use crate::auth::{PrincipalPermissionSource, SourceError};

#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    role_name: Option<String>,
    permission_name: Option<String>,
}

/// Table holding principals of the given type
fn principal_table(user_type: UserType) -> &'static str {
    match user_type {
        UserType::Admin => "admins",
        UserType::Employee => "employees",
        UserType::User => "users",
    }
}

#[derive(Clone)]
pub struct SqlitePermissionSource {
    pool: SqlitePool,
}

impl SqlitePermissionSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalPermissionSource for SqlitePermissionSource {
    async fn find_principal(
        &self,
        user_type: UserType,
        id: &PrincipalId,
    ) -> Result<Option<PrincipalRecord>, SourceError> {
        // principal 行左连接角色与授权，一条查询取回全部
        let sql = format!(
            "SELECT r.name AS role_name, p.name AS permission_name
             FROM {} AS u
             LEFT JOIN roles AS r ON r.id = u.role_id
             LEFT JOIN role_permissions AS rp ON rp.role_id = r.id
             LEFT JOIN permissions AS p ON p.id = rp.permission_id
             WHERE u.id = ?
             ORDER BY p.id",
            principal_table(user_type)
        );

        let query = sqlx::query_as::<_, GrantRow>(&sql);
        let query = match id {
            PrincipalId::Int(id) => query.bind(*id),
            PrincipalId::Str(id) => query.bind(id.as_str()),
        };
        let rows = query.fetch_all(&self.pool).await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let Some(role_name) = first.role_name.clone() else {
            return Ok(Some(PrincipalRecord::default()));
        };

        let permissions = rows.into_iter().filter_map(|row| row.permission_name);
        Ok(Some(PrincipalRecord::with_role(RoleRecord::new(
            role_name,
            permissions,
        ))))
    }
}
