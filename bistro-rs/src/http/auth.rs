use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tracing::{debug, warn};

use crate::token::Claims;

use super::error::ApiError;
use super::state::AppState;

/// Extract the bearer token, distinguishing a missing header from a
/// malformed one.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingCredential)?;
    let mut parts = raw.split_whitespace();
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(ApiError::InvalidCredential);
    };
    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().is_some() {
        return Err(ApiError::InvalidCredential);
    }
    Ok(token)
}

/// Verify the request's bearer token and return its claims.
pub fn require_claims(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)?;
    match state.tokens.verify(token) {
        Ok(claims) => {
            debug!(email = %claims.email, "verified bearer token");
            Ok(claims)
        }
        Err(error) => {
            warn!(error = %error, "rejected bearer token");
            Err(ApiError::InvalidCredential)
        }
    }
}

/// Deny unless the claims email belongs to a user with the admin role.
/// Runs before any resource store access in the gated handlers.
pub async fn require_admin(state: &AppState, claims: &Claims) -> Result<(), ApiError> {
    let user = state.store.find_user_by_email(&claims.email).await?;
    if user.is_some_and(|user| user.is_admin()) {
        Ok(())
    } else {
        warn!(email = %claims.email, "admin access denied");
        Err(ApiError::Forbidden)
    }
}

/// Identity equality check for self-scoped lookups; not a role check.
pub fn ensure_self(requested_email: &str, claims: &Claims) -> Result<(), ApiError> {
    if requested_email == claims.email {
        Ok(())
    } else {
        warn!(
            requested = %requested_email,
            caller = %claims.email,
            "cross-identity lookup denied"
        );
        Err(ApiError::Forbidden)
    }
}
