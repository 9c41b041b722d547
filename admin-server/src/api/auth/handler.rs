//! Authorization diagnostics handlers

use axum::{Json, extract::State};
use serde::Serialize;
use shared::models::{PrincipalId, UserType};

use crate::auth::evaluator::is_super;
use crate::auth::{CurrentPrincipal, Requirement, Verdict};
use crate::core::ServerState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: PrincipalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    /// Role used for rank and defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_role: Option<String>,
    pub role_level: u32,
    pub is_super_admin: bool,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    /// The unmet requirement when denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Requirement>,
}

/// Current principal handler
pub async fn me(
    State(state): State<ServerState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Json<MeResponse> {
    let evaluator = state.evaluator();

    Json(MeResponse {
        role_level: evaluator.role_level(&principal),
        is_super_admin: is_super(&principal),
        effective_role: principal.effective_role().map(str::to_string),
        permissions: principal
            .permissions
            .iter()
            .flatten()
            .map(|p| p.name().to_string())
            .collect(),
        user_type: principal.user_type,
        id: principal.id,
    })
}

/// Evaluate a requirement for the caller without failing the request
pub async fn check(
    State(state): State<ServerState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Json(requirement): Json<Requirement>,
) -> Json<CheckResponse> {
    let response = match state.evaluator().check(&principal, &requirement) {
        Verdict::Allow => CheckResponse {
            allowed: true,
            required: None,
        },
        Verdict::Deny(unmet) => CheckResponse {
            allowed: false,
            required: Some(unmet),
        },
    };

    tracing::debug!(
        principal_id = %principal.id,
        requirement = %requirement,
        allowed = response.allowed,
        "Authorization check"
    );

    Json(response)
}
