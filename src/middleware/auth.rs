//! Authentication middleware
//!
//! Extractors that read `Authorization: Bearer <token>`, validate the token
//! for a specific kind and hand the claims to the handler. A handler taking
//! one of these never runs for a missing, malformed, expired or wrong-kind
//! token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::{AuthService, Claims, TokenKind};
use crate::error::ApiError;

/// Claims of a validated access token
#[derive(Debug, Clone)]
pub struct AccessClaims(pub Claims);

/// Claims of a validated refresh token
#[derive(Debug, Clone)]
pub struct RefreshClaims(pub Claims);

async fn bearer_claims<S>(parts: &mut Parts, state: &S, kind: TokenKind) -> Result<Claims, ApiError>
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ApiError::ValidationError(
                    "Authorization header with Bearer token required".to_string(),
                )
            })?;

    let auth_service = Arc::<AuthService>::from_ref(state);

    auth_service
        .parse_token(bearer.token(), kind)
        .map_err(ApiError::from)
}

#[async_trait]
impl<S> FromRequestParts<S> for AccessClaims
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, state, TokenKind::Access)
            .await
            .map(AccessClaims)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RefreshClaims
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, state, TokenKind::Refresh)
            .await
            .map(RefreshClaims)
    }
}
