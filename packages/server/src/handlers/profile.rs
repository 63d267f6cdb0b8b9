use axum::{Json, extract::State};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{profile, user};
use crate::error::{AppError, ErrorBody};
use crate::events::SessionEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::profile::{ProfileResponse, UpdateProfileRequest, validate_update_profile};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Profile",
    operation_id = "getProfile",
    summary = "Get the caller's profile",
    description = "Returns the profile of the signed-in user. A user without a profile gets one with empty names created on first access.",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = ensure_profile(&state.db, auth_user.user_id).await?;
    let email = find_email(&state.db, auth_user.user_id).await?;
    Ok(Json(ProfileResponse::new(profile, email)))
}

#[utoipa::path(
    patch,
    path = "/",
    tag = "Profile",
    operation_id = "updateProfile",
    summary = "Update the caller's profile",
    description = "Sets first and/or last name. Provided names must not be blank. Publishes a `profile_updated` event.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_update_profile(&payload)?;

    let existing = ensure_profile(&state.db, auth_user.user_id).await?;
    let now = Utc::now();

    let mut active = existing.into_active_model();
    if let Some(first) = payload.first_name {
        active.first_name = Set(Some(first.trim().to_string()));
    }
    if let Some(last) = payload.last_name {
        active.last_name = Set(Some(last.trim().to_string()));
    }
    active.updated_at = Set(now);
    let profile = active.update(&state.db).await?;

    state.session_events.publish(SessionEvent::ProfileUpdated {
        user_id: auth_user.user_id,
        at: now,
    });

    let email = find_email(&state.db, auth_user.user_id).await?;
    Ok(Json(ProfileResponse::new(profile, email)))
}

/// Load the user's profile, creating an empty one if none exists yet.
///
/// Concurrent first accesses insert at most one row.
pub async fn ensure_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<profile::Model, AppError> {
    if let Some(existing) = profile::Entity::find_by_id(user_id).one(db).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let result = profile::Entity::insert(profile::ActiveModel {
        id: Set(user_id),
        first_name: Set(None),
        last_name: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(profile::Column::Id)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await;

    match result {
        Ok(n) if n > 0 => tracing::info!(user_id, "Created missing profile"),
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    profile::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("profile missing after insert".into()))
}

async fn find_email<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<String, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .map(|u| u.email)
        .ok_or(AppError::TokenInvalid)
}
