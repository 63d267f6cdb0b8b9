use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::models::shared::validate_required_text;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 100;

/// Request body for sign-up.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    #[schema(example = "anna@example.de")]
    pub email: String,
    /// Password (6-128 characters).
    #[schema(example = "geheim123")]
    pub password: String,
    #[schema(example = "Anna")]
    pub first_name: String,
    #[schema(example = "Schmidt")]
    pub last_name: String,
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    let len = payload.password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
            "Das Passwort muss {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} Zeichen lang sein"
        )));
    }
    validate_required_text(&payload.first_name, "Der Vorname", MAX_NAME_LEN)?;
    validate_required_text(&payload.last_name, "Der Nachname", MAX_NAME_LEN)?;
    Ok(())
}

/// Request body for sign-in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "anna@example.de")]
    pub email: String,
    #[schema(example = "geheim123")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Die E-Mail-Adresse darf nicht leer sein".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Das Passwort darf nicht leer sein".into()));
    }
    Ok(())
}

/// Canonical form under which e-mail addresses are stored and looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let invalid = || AppError::Validation("Bitte eine gültige E-Mail-Adresse angeben".into());

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    Ok(())
}

/// Identity of a user as exposed to clients.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "anna@example.de")]
    pub email: String,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            last_sign_in_at: u.last_sign_in_at,
            created_at: u.created_at,
        }
    }
}

/// Successful sign-in.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token, valid until `expires_at` or sign-out.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

/// The current session.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}
