//! Data models
//!
//! Shared between the admin server and its clients (via API).

pub mod principal;
pub mod role;

// Re-exports
pub use principal::*;
pub use role::*;
