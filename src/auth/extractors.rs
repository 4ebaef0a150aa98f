use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::services::{JwtKeys, TokenKind};
use crate::error::AppError;

/// Extracts and validates the access token, returning the user ID.
///
/// Use `Option<AuthUser>` on endpoints that are readable anonymously.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Accepts `Bearer <token>` and the `Token <token>` scheme.
pub(crate) fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .or_else(|| value.strip_prefix("Token "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated("Authentication credentials were not provided.".into())
            })?;

        let token = token_from_header(auth_header)
            .ok_or_else(|| AppError::Unauthenticated("Invalid Authorization header.".into()))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err(AppError::Unauthenticated("Invalid or expired token.".into()));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthenticated("Access token required.".into()));
        }

        Ok(AuthUser(claims.sub))
    }
}
