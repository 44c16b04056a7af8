//! Credential Service Library
//!
//! Account registration, email/password login, and access/refresh token
//! issuance for a user-account service.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
