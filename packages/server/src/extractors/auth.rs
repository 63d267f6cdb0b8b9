use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::{recipe, session};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The token must
/// verify and its session must still be active, so signed-out tokens are
/// rejected even before they expire.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub session_id: Uuid,
    pub session_expires_at: DateTime<Utc>,
}

impl AuthUser {
    /// Returns `Ok(())` if the user owns the recipe, `Err(PermissionDenied)` otherwise.
    pub fn require_owner(&self, recipe: &recipe::Model) -> Result<(), AppError> {
        if recipe.user_id == self.user_id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let session = session::Entity::find_by_id(claims.sid)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        if session.user_id != claims.uid || !session.is_active(Utc::now()) {
            tracing::debug!(session_id = %claims.sid, "Rejected token of inactive session");
            return Err(AppError::TokenInvalid);
        }

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
            session_id: claims.sid,
            session_expires_at: session.expires_at,
        })
    }
}

/// Optional authentication for public endpoints.
///
/// A missing header yields `None`; a present but invalid token is still rejected.
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key("Authorization") {
            return Ok(MaybeAuthUser(None));
        }
        AuthUser::from_request_parts(parts, state)
            .await
            .map(|user| MaybeAuthUser(Some(user)))
    }
}
