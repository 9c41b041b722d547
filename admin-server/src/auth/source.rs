//! Principal permission source
//!
//! Keyed lookup into the back-office store: `(user_type, id)` → the
//! principal's role and that role's permission grants. Implementations only
//! read; the resolver issues exactly one lookup per call.

use async_trait::async_trait;
use shared::models::{PrincipalId, PrincipalRecord, UserType};
use thiserror::Error;

/// Lookup faults. Never surfaced to callers of the resolver.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("Lookup cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        SourceError::Database(err.to_string())
    }
}

#[async_trait]
pub trait PrincipalPermissionSource: Send + Sync {
    /// Fetch the principal's record; `Ok(None)` when no such principal exists
    async fn find_principal(
        &self,
        user_type: UserType,
        id: &PrincipalId,
    ) -> Result<Option<PrincipalRecord>, SourceError>;
}
