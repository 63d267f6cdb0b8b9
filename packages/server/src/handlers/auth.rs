use std::convert::Infallible;
use std::future;
use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures::{Stream, StreamExt};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{profile, session, user};
use crate::error::{AppError, ErrorBody};
use crate::events::{SessionEvent, UserStreamItem, user_event_stream};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, SessionResponse, SignupRequest, UserResponse, normalize_email,
    validate_login_request, validate_signup_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

const SSE_KEEP_ALIVE_SECS: u64 = 15;

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Create an account",
    description = "Creates a user and its profile in one transaction. The e-mail address is stored trimmed and lower-cased.",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "E-mail already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup_request(&payload)?;

    let email = normalize_email(&payload.email);
    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
    let now = Utc::now();

    let txn = state.db.begin().await?;

    let new_user = user::ActiveModel {
        email: Set(email),
        password: Set(hash),
        last_sign_in_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    };
    let user = new_user.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Sign-up rejected: e-mail already registered");
            AppError::EmailTaken
        }
        _ => AppError::from(e),
    })?;

    profile::ActiveModel {
        id: Set(user.id),
        first_name: Set(Some(payload.first_name.trim().to_string())),
        last_name: Set(Some(payload.last_name.trim().to_string())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(user_id = user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Sign in with e-mail and password",
    description = "Opens a new session and returns a bearer token bound to it. The token stays valid until it expires or the session is signed out.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong e-mail or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = normalize_email(&payload.email);

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(state.config.auth.session_ttl_hours);
    let session_id = Uuid::now_v7();

    let txn = state.db.begin().await?;

    session::ActiveModel {
        id: Set(session_id),
        user_id: Set(user.id),
        created_at: Set(now),
        expires_at: Set(expires_at),
        revoked_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut active = user.into_active_model();
    active.last_sign_in_at = Set(Some(now));
    let user = active.update(&txn).await?;

    txn.commit().await?;

    let token = jwt::sign(
        user.id,
        &user.email,
        session_id,
        expires_at,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    state.session_events.publish(SessionEvent::SignedIn {
        user_id: user.id,
        session_id,
        at: now,
    });
    tracing::info!(user_id = user.id, %session_id, "User signed in");

    Ok(Json(LoginResponse {
        token,
        session_id,
        expires_at,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Sign out the current session",
    description = "Revokes the session of the presented token. Later requests with that token are rejected with TOKEN_INVALID.",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn logout(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();

    session::Entity::update_many()
        .col_expr(session::Column::RevokedAt, Expr::value(Some(now)))
        .filter(session::Column::Id.eq(auth_user.session_id))
        .filter(session::Column::RevokedAt.is_null())
        .exec(&state.db)
        .await?;

    state.session_events.publish(SessionEvent::SignedOut {
        user_id: auth_user.user_id,
        session_id: auth_user.session_id,
        at: now,
    });
    tracing::info!(session_id = %auth_user.session_id, "User signed out");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/session",
    tag = "Auth",
    operation_id = "getSession",
    summary = "Get the current session",
    description = "Returns the signed-in user and the expiry of the current session.",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_session(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let (user, session) = tokio::try_join!(
        user::Entity::find_by_id(auth_user.user_id).one(&state.db),
        session::Entity::find_by_id(auth_user.session_id).one(&state.db),
    )?;

    let user = user.ok_or(AppError::TokenInvalid)?;
    let session = session.ok_or(AppError::TokenInvalid)?;

    Ok(Json(SessionResponse {
        session_id: session.id,
        expires_at: session.expires_at,
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "Auth",
    operation_id = "streamSessionEvents",
    summary = "Stream authentication changes",
    description = "Server-Sent Events stream of `signed_in`, `signed_out` and `profile_updated` events for the calling user. \
        Each event's data is the JSON-encoded event. A `lagged` event (data `resync`) tells a slow client that events were \
        dropped and it should re-fetch its session. The stream ends after this session's own `signed_out` event or when \
        the session expires.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = SessionEvent),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn session_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let stream = user_event_stream(
        state.session_events.subscribe(),
        auth_user.user_id,
        auth_user.session_id,
        auth_user.session_expires_at,
    )
    .filter_map(|item| future::ready(sse_event(item).map(Ok::<_, Infallible>)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

fn sse_event(item: UserStreamItem) -> Option<Event> {
    match item {
        UserStreamItem::Event(event) => match serde_json::to_string(&event) {
            Ok(data) => Some(Event::default().event(event.kind()).data(data)),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unserializable session event");
                None
            }
        },
        UserStreamItem::Lagged => Some(Event::default().event("lagged").data("resync")),
    }
}
