//! Permission Resolver
//!
//! Resolves a principal's effective permission names through the optional
//! [`PrincipalPermissionSource`].
//!
//! # Rules
//!
//! | lookup result | resolved permissions |
//! |---------------|----------------------|
//! | record with role | the role's permission names |
//! | no record / no role / no source | defaults of `access_level`, then `role`, then `user_type` |
//! | error, timeout, cancellation | empty (fail-closed, logged) |
//!
//! Resolution never fails and never retries.

use std::sync::Arc;
use std::time::Duration;

use shared::models::{Principal, PrincipalRecord, UserType, first_non_empty};
use tokio_util::sync::CancellationToken;

use super::policy::PolicyTable;
use super::source::{PrincipalPermissionSource, SourceError};
use crate::security_log;

/// Default bound on a single store lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Clone)]
pub struct PermissionResolver {
    policy: Arc<PolicyTable>,
    source: Option<Arc<dyn PrincipalPermissionSource>>,
    lookup_timeout: Duration,
}

impl PermissionResolver {
    pub fn new(
        policy: Arc<PolicyTable>,
        source: Option<Arc<dyn PrincipalPermissionSource>>,
    ) -> Self {
        Self {
            policy,
            source,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Resolve permission names for `principal`
    pub async fn resolve(&self, principal: &Principal) -> Vec<String> {
        self.resolve_with_cancel(principal, &CancellationToken::new())
            .await
    }

    /// Resolve permission names, abandoning the lookup when `cancel` fires
    pub async fn resolve_with_cancel(
        &self,
        principal: &Principal,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        match self.lookup(principal, cancel).await {
            Ok(Some(PrincipalRecord { role: Some(role) })) => role.permission_names(),
            Ok(_) => self.fallback_permissions(principal),
            Err(e) => {
                security_log!(
                    "WARN",
                    "permission_source_fault",
                    principal_id = principal.id.to_string(),
                    user_type = principal.user_type.map(|t| t.as_str()).unwrap_or("none"),
                    error = e.to_string()
                );
                tracing::warn!(
                    principal_id = %principal.id,
                    error = %e,
                    "Permission lookup failed, resolving to no permissions"
                );
                Vec::new()
            }
        }
    }

    async fn lookup(
        &self,
        principal: &Principal,
        cancel: &CancellationToken,
    ) -> Result<Option<PrincipalRecord>, SourceError> {
        let (Some(source), Some(user_type)) = (&self.source, principal.user_type) else {
            return Ok(None);
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            result = tokio::time::timeout(
                self.lookup_timeout,
                source.find_principal(user_type, &principal.id),
            ) => match result {
                Ok(found) => found,
                Err(_) => Err(SourceError::Timeout(
                    u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
                )),
            },
        }
    }

    /// Defaults used when the store has nothing for the principal.
    ///
    /// Note the key order differs from the evaluator's: `access_level` first.
    fn fallback_permissions(&self, principal: &Principal) -> Vec<String> {
        let key = first_non_empty([
            principal.access_level.as_deref(),
            principal.role.as_deref(),
            principal.user_type.as_ref().map(UserType::as_str),
        ]);
        self.policy.default_permissions_for(key)
    }
}
