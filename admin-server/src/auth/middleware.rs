//! 认证与授权中间件
//!
//! - [`attach_principal`]: 解析 Bearer 令牌，把 [`Principal`] 注入请求扩展
//! - [`load_permissions`]: 为没有显式权限的主体解析权限
//! - `require_*`: 权限 / 角色门禁
//!
//! # 用法
//!
//! ```ignore
//! use axum::middleware;
//! Router::new()
//!     .route("/api/orders/{id}", delete(handler::delete))
//!     .layer(middleware::from_fn_with_state(state.clone(), require_permission("order.delete")))
//!     .layer(middleware::from_fn_with_state(state.clone(), load_permissions))
//!     .layer(middleware::from_fn_with_state(state.clone(), attach_principal));
//! ```

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::models::Principal;

use crate::AppError;
use crate::auth::{AuthorizationEvaluator, JwtError, JwtService, Requirement, Verdict};
use crate::core::ServerState;
use crate::security_log;

/// 门禁中间件返回的 future
pub type GateFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 认证中间件 - 附加主体
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`Principal`] 注入请求扩展。
///
/// | 情况 | 结果 |
/// |------|------|
/// | 无 Authorization 头 | 放行，不附加主体 (门禁返回 401) |
/// | 头格式错误 / 无效令牌 | 401 TokenInvalid |
/// | 令牌过期 | 401 TokenExpired |
pub async fn attach_principal(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION).cloned() else {
        return Ok(next.run(req).await);
    };
    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::invalid_token("Invalid authorization header"))?;

    let token = JwtService::extract_from_header(auth_header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    match state.jwt_service().principal_from_token(token) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 加载权限中间件
///
/// 主体没有显式权限列表时，通过 [`PermissionResolver`](crate::auth::PermissionResolver)
/// 解析并附加。解析失败得到空列表，之后所有非超管检查都会拒绝。
///
/// 查询随请求 future 一起被丢弃即取消，不受服务器关闭信号影响。
pub async fn load_permissions(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let pending = req
        .extensions()
        .get::<Principal>()
        .filter(|p| p.permissions.is_none())
        .cloned();

    if let Some(principal) = pending {
        let resolved = state.resolver().resolve(&principal).await;
        tracing::debug!(
            principal_id = %principal.id,
            count = resolved.len(),
            "Permissions loaded"
        );
        req.extensions_mut()
            .insert(principal.with_permissions(resolved));
    }

    next.run(req).await
}

/// 权限检查中间件 - 要求特定权限
///
/// 未认证返回 401，无权限返回 403 并携带 `required_permission`。
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(State<ServerState>, Request, Next) -> GateFuture + Clone {
    gate(Requirement::permission(permission))
}

/// 要求任一权限 (空列表永远拒绝)
pub fn require_any_permission(
    permissions: &'static [&'static str],
) -> impl Fn(State<ServerState>, Request, Next) -> GateFuture + Clone {
    gate(Requirement::any_of(permissions.iter().copied()))
}

/// 要求全部权限 (空列表永远放行已认证主体)
pub fn require_all_permissions(
    permissions: &'static [&'static str],
) -> impl Fn(State<ServerState>, Request, Next) -> GateFuture + Clone {
    gate(Requirement::all_of(permissions.iter().copied()))
}

/// 角色中间件 - 要求最低角色
///
/// 角色不足返回 403 (RoleRequired) 并携带 `required_role`。
pub fn require_role(
    min_role: &'static str,
) -> impl Fn(State<ServerState>, Request, Next) -> GateFuture + Clone {
    gate(Requirement::role(min_role))
}

fn gate(
    requirement: Requirement,
) -> impl Fn(State<ServerState>, Request, Next) -> GateFuture + Clone {
    move |State(state): State<ServerState>, req: Request, next: Next| {
        let requirement = requirement.clone();
        Box::pin(async move {
            authorize(
                state.evaluator(),
                req.extensions().get::<Principal>(),
                &requirement,
            )?;
            Ok(next.run(req).await)
        })
    }
}

/// 对单个主体执行门禁判断
///
/// 没有主体返回 401，检查未通过返回 403。
pub fn authorize(
    evaluator: &AuthorizationEvaluator,
    principal: Option<&Principal>,
    requirement: &Requirement,
) -> Result<(), AppError> {
    let Some(principal) = principal else {
        security_log!(
            "WARN",
            "auth_missing",
            required = requirement.to_string()
        );
        return Err(AppError::unauthorized());
    };

    match evaluator.check(principal, requirement) {
        Verdict::Allow => Ok(()),
        Verdict::Deny(unmet) => {
            security_log!(
                "WARN",
                "permission_denied",
                principal_id = principal.id.to_string(),
                role = principal.effective_role().unwrap_or("none").to_string(),
                required = unmet.to_string()
            );
            Err(denial_error(&unmet))
        }
    }
}

/// 拒绝时的 403 响应
pub fn denial_error(requirement: &Requirement) -> AppError {
    match requirement {
        Requirement::Permission(permission) => AppError::forbidden(format!(
            "Insufficient permissions. Required: {}",
            permission
        ))
        .with_detail("required_permission", permission.clone()),
        Requirement::AnyOf(permissions) => AppError::forbidden(format!(
            "Insufficient permissions. Required any of: {}",
            permissions.join(", ")
        ))
        .with_detail("required_permissions", permissions.clone()),
        Requirement::AllOf(permissions) => AppError::forbidden(format!(
            "Insufficient permissions. Required all of: {}",
            permissions.join(", ")
        ))
        .with_detail("required_permissions", permissions.clone()),
        Requirement::Role(role) => {
            AppError::role_required(format!("Insufficient role. Required: {}", role))
                .with_detail("required_role", role.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use shared::models::UserType;

    fn evaluator() -> AuthorizationEvaluator {
        AuthorizationEvaluator::default()
    }

    #[test]
    fn test_authorize_without_principal() {
        let err = authorize(&evaluator(), None, &Requirement::permission("order.read"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
        assert_eq!(err.message, "Authentication required");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_authorize_permission_denied() {
        let employee = Principal::new(2)
            .with_user_type(UserType::Employee)
            .with_role("employee");
        let err = authorize(
            &evaluator(),
            Some(&employee),
            &Requirement::permission("invoice.update"),
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(
            err.message,
            "Insufficient permissions. Required: invoice.update"
        );
        assert_eq!(
            err.detail("required_permission"),
            Some(&serde_json::json!("invoice.update"))
        );
    }

    #[test]
    fn test_authorize_allows() {
        let employee = Principal::new(2).with_role("employee");
        assert!(
            authorize(
                &evaluator(),
                Some(&employee),
                &Requirement::permission("order.create")
            )
            .is_ok()
        );
        assert!(
            authorize(
                &evaluator(),
                Some(&employee),
                &Requirement::all_of(Vec::<String>::new())
            )
            .is_ok()
        );
    }

    #[test]
    fn test_denial_messages() {
        let any = denial_error(&Requirement::any_of(["a.read", "b.read"]));
        assert_eq!(any.message, "Insufficient permissions. Required any of: a.read, b.read");
        assert_eq!(
            any.detail("required_permissions"),
            Some(&serde_json::json!(["a.read", "b.read"]))
        );

        let all = denial_error(&Requirement::all_of(["a.read", "b.read"]));
        assert_eq!(all.message, "Insufficient permissions. Required all of: a.read, b.read");

        let role = denial_error(&Requirement::role("manager"));
        assert_eq!(role.code, ErrorCode::RoleRequired);
        assert_eq!(role.message, "Insufficient role. Required: manager");
        assert_eq!(
            role.detail("required_role"),
            Some(&serde_json::json!("manager"))
        );
    }
}
