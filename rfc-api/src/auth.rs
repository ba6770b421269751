//! Caller identity extraction
//!
//! Identity management is a collaborator concern - an upstream gateway
//! authenticates the caller and forwards the resolved user id in the
//! `X-User-Id` header. The extractor looks the user up so handlers receive
//! a full `User` record with its role.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use rfc_core::User;
use uuid::Uuid;

/// Header carrying the authenticated caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;

        let user_id = Uuid::parse_str(header)
            .map_err(|_| ApiError::unauthorized("Malformed X-User-Id header"))?;

        let user = state
            .store
            .user_get(user_id)
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

        Ok(CurrentUser(user))
    }
}
