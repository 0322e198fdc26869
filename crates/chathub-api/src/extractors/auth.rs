//! `AuthUser` extractor. Pulls the bearer token from the Authorization
//! header, verifies it, and checks that the user still exists.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use chathub_auth::verifier::AUTHENTICATION_ERROR;
use chathub_core::error::AppError;
use chathub_core::types::id::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller of a REST handler.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// Verified user ID.
    pub user_id: UserId,
}

/// Returns the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).unwrap_or_default();
        let user_id = state.verifier.verify(token).await?;

        if state.store.find_user(user_id).await?.is_none() {
            debug!(user_id = %user_id, "Token subject no longer exists");
            return Err(AppError::authentication(AUTHENTICATION_ERROR).into());
        }

        Ok(AuthUser { user_id })
    }
}
