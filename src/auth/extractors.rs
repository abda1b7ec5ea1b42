use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_cookies::Cookies;
use tracing::warn;

use super::claims::Claims;
use super::jwt::JwtKeys;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "token";

/// Validates the session token and exposes the decoded identity.
/// The cookie is preferred; a bearer header is the fallback.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(AppError::Unauthenticated)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            AppError::InvalidToken
        })?;

        Ok(AuthUser(claims))
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(cookies) = parts.extensions.get::<Cookies>() {
        if let Some(cookie) = cookies.get(SESSION_COOKIE) {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(|t| t.to_string())
}
