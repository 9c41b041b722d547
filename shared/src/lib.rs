//! Shared types for the back-office
//!
//! Common types used across crates: the unified error system, API response
//! structures and the principal/role models the authorization layer reads.

pub mod error;
pub mod models;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{PermissionEntry, Principal, PrincipalId, PrincipalRecord, RoleRecord, UserType};
