//! Middleware for the credential service
//!
//! Request tracing, security headers, and the bearer-token extractors that
//! gate authenticated routes.

pub mod auth;
mod request_trace;
mod security;

pub use auth::{AccessClaims, RefreshClaims};
pub use request_trace::{request_tracing, REQUEST_ID_HEADER};
pub use security::security_headers;
