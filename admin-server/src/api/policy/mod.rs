//! Policy table routes
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/policy/roles | GET | role.read |
//! | /api/policy/roles/{role}/permissions | GET | role.read |

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::get,
};
use serde::Serialize;

use crate::AppError;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/policy/roles", get(list_roles))
        .route("/api/policy/roles/{role}/permissions", get(role_permissions))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission("role.read"),
        ))
}

#[derive(Debug, Serialize)]
pub struct RoleLevel {
    pub name: String,
    pub level: u32,
}

/// Ranked roles, highest first
pub async fn list_roles(State(state): State<ServerState>) -> Json<Vec<RoleLevel>> {
    let mut roles: Vec<RoleLevel> = state
        .evaluator()
        .policy()
        .role_hierarchy
        .iter()
        .map(|(name, level)| RoleLevel {
            name: name.clone(),
            level: *level,
        })
        .collect();
    roles.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.name.cmp(&b.name)));
    Json(roles)
}

/// Default permission set of a role
pub async fn role_permissions(
    State(state): State<ServerState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let policy = state.evaluator().policy();
    if !policy.role_hierarchy.contains_key(&role) && !policy.default_permissions.contains_key(&role)
    {
        return Err(AppError::not_found(format!("Role {} not found", role)));
    }
    Ok(Json(policy.default_permissions_for(Some(role.as_str()))))
}
