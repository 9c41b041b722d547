#![allow(dead_code)]

use std::sync::Arc;

use admin_server::auth::{
    PrincipalPermissionSource, SourceError, attach_principal, load_permissions,
    require_all_permissions, require_any_permission, require_permission, require_role,
};
use admin_server::{Config, PolicyTable, ServerState};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::{delete, get, post},
};
use http_body_util::BodyExt;
use shared::models::{Principal, PrincipalId, PrincipalRecord, UserType};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-long-enough-for-hs256";

pub struct StaticSource(pub Option<PrincipalRecord>);

#[async_trait]
impl PrincipalPermissionSource for StaticSource {
    async fn find_principal(
        &self,
        _user_type: UserType,
        _id: &PrincipalId,
    ) -> Result<Option<PrincipalRecord>, SourceError> {
        Ok(self.0.clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl PrincipalPermissionSource for FailingSource {
    async fn find_principal(
        &self,
        _user_type: UserType,
        _id: &PrincipalId,
    ) -> Result<Option<PrincipalRecord>, SourceError> {
        Err(SourceError::Database("database is locked".into()))
    }
}

pub fn state_with(source: Option<Arc<dyn PrincipalPermissionSource>>) -> ServerState {
    ServerState::new(Config::for_tests(TEST_SECRET), PolicyTable::default(), source)
}

pub fn token_for(state: &ServerState, principal: &Principal) -> String {
    state.jwt_service().generate_token(principal).unwrap()
}

async fn ok() -> &'static str {
    "ok"
}

/// Back-office style routes guarded by each gate kind
pub fn gated_app(state: &ServerState) -> Router {
    let delete_order = Router::new()
        .route("/orders/{id}", delete(ok))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission("order.delete"),
        ));
    let create_order = Router::new()
        .route("/orders", post(ok))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_permission("order.create"),
        ));
    let invoices = Router::new()
        .route("/invoices", get(ok))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_any_permission(&["invoice.update", "order.read"]),
        ));
    let refunds = Router::new()
        .route("/refunds", post(ok))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_all_permissions(&["order.read", "invoice.update"]),
        ));
    let reports = Router::new()
        .route("/reports", get(ok))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_role("manager"),
        ));

    Router::new()
        .merge(delete_order)
        .merge(create_order)
        .merge(invoices)
        .merge(refunds)
        .merge(reports)
        .layer(middleware::from_fn_with_state(state.clone(), load_permissions))
        .layer(middleware::from_fn_with_state(state.clone(), attach_principal))
        .with_state(state.clone())
}

pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}
