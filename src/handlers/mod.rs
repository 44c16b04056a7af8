//! API handlers for the credential service

pub mod auth;

pub use auth::*;

// Re-export the token extractors for handler use
pub use crate::middleware::auth::{AccessClaims, RefreshClaims};
