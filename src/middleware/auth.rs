use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt};
use tracing::debug;

use crate::db::models::OwnerId;
use crate::error::LedgerError;
use crate::router::LedgerState;

/// Bearer token from `Authorization: Bearer <token>`.
///
/// `Ok(None)` when no authorization header is sent at all; a header that is
/// present but not a usable bearer credential is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, LedgerError> {
    match headers.typed_try_get::<Authorization<Bearer>>() {
        Ok(None) => Ok(None),
        Ok(Some(auth)) => {
            let token = auth.token().trim();
            if token.is_empty() {
                return Err(LedgerError::Unauthenticated);
            }
            Ok(Some(token.to_string()))
        }
        Err(_) => Err(LedgerError::Unauthenticated),
    }
}

/// Resolve the caller's identity for this request.
pub async fn resolve_owner(state: &LedgerState, headers: &HeaderMap) -> Result<OwnerId, LedgerError> {
    match bearer_token(headers)? {
        Some(token) => state
            .users
            .resolve_token(&token)
            .await?
            .ok_or(LedgerError::Unauthenticated),
        None if !state.access.require_auth => {
            let Some(name) = state.access.anonymous_user.as_deref() else {
                return Err(LedgerError::Unauthenticated);
            };
            let user = state
                .users
                .find_user(name)
                .await?
                .ok_or(LedgerError::Unauthenticated)?;
            debug!(user = %user.username, "anonymous request mapped to configured user");
            Ok(OwnerId(user.id))
        }
        None => Err(LedgerError::Unauthenticated),
    }
}

/// The authenticated owner of the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub OwnerId);

impl FromRequestParts<LedgerState> for AuthUser {
    type Rejection = LedgerError;

    async fn from_request_parts(parts: &mut Parts, state: &LedgerState) -> Result<Self, Self::Rejection> {
        resolve_owner(state, &parts.headers).await.map(AuthUser)
    }
}
