//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 授权诊断接口
//! - [`policy`] - 策略表查询

pub mod auth;
pub mod health;
pub mod policy;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{attach_principal, load_permissions};
use crate::core::ServerState;

/// Build a router with all routes registered (no global middleware)
///
/// 只有受保护路由解析 Bearer 令牌，公开路由忽略 Authorization 头。
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    let protected = Router::new()
        .merge(auth::router())
        .merge(policy::router(state))
        // 门禁之前先解析权限
        .layer(middleware::from_fn_with_state(state.clone(), load_permissions))
        // 解析 Bearer 令牌并注入 Principal
        .layer(middleware::from_fn_with_state(state.clone(), attach_principal));

    Router::new()
        // Health API - public route
        .merge(health::router())
        .merge(protected)
}

/// Build a fully configured application with all middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router(&state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
