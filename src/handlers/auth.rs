//! Authentication HTTP handlers
//!
//! Every failure is answered with a generic error body; see
//! [`crate::error::ApiError`].

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use super::{AccessClaims, RefreshClaims};
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, TokenPairResponse, UserResponse};
use crate::state::AppState;

/// POST /auth/register - Create an account
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;

    state.auth_service.register(req).await?;

    Ok(StatusCode::OK)
}

/// POST /auth/login - Exchange email and password for a token pair
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let Json(req) = payload?;

    let tokens = state.auth_service.authorize_email(&req).await?;

    Ok(Json(TokenPairResponse::new("success login", tokens)))
}

/// POST /auth/refresh - Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    RefreshClaims(claims): RefreshClaims,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let tokens = state.auth_service.refresh(&claims).await?;

    Ok(Json(TokenPairResponse::new("success refresh", tokens)))
}

/// GET /auth/me - Account behind the presented access token
pub async fn get_current_user(
    State(state): State<AppState>,
    AccessClaims(claims): AccessClaims,
) -> Result<Json<UserResponse>, ApiError> {
    let account = state
        .auth_service
        .get_user(&claims.email)
        .await
        .map_err(|e| match e {
            AuthError::AccountNotFound => ApiError::NotFound("account".to_string()),
            other => ApiError::from(other),
        })?;

    Ok(Json(account.into()))
}
