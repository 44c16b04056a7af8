//! Route definitions for the credential service API

mod auth;

use axum::{routing::get, Router};

use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;

/// Build the application router with its middleware stack.
///
/// CORS and the health endpoint depend on deployment resources and are
/// layered on in `main`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .merge(auth_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
}

async fn root() -> &'static str {
    "Credential Service API"
}
