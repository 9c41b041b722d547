//! Authorization diagnostics routes
//!
//! - GET /api/auth/me: the caller and their effective permissions
//! - POST /api/auth/check: evaluate a requirement for the caller

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/me", get(handler::me))
        .route("/api/auth/check", post(handler::check))
}
