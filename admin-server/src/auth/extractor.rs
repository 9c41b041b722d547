//! Principal Extractor
//!
//! Reads the principal attached by [`attach_principal`](super::attach_principal)

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::models::Principal;

use crate::AppError;

/// Authenticated principal of the current request
///
/// Rejects with 401 when no principal was attached.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(AppError::unauthorized)
    }
}

impl std::ops::Deref for CurrentPrincipal {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
