//! Bearer token extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::ChatError;

/// The account a request is authenticated as.
///
/// Extracted from an `Authorization: Bearer <token>` header; requests
/// without a valid token are rejected with `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// Authenticated account.
    pub user_id: UserId,
    /// Client installation the token was issued to.
    pub application_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ChatError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;
        Ok(Self {
            user_id: claims.user_id()?,
            application_id: claims.application_id,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ChatError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ChatError::Unauthorized("missing bearer token".to_string()))?
        .to_str()
        .map_err(|_| ChatError::Unauthorized("malformed authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ChatError::Unauthorized("expected a bearer token".to_string()))
}
