use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::profile;
use crate::error::AppError;
use crate::models::shared::validate_required_text;

const MAX_NAME_LEN: usize = 100;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "anna@example.de")]
    pub email: String,
    #[schema(example = "Anna")]
    pub first_name: Option<String>,
    #[schema(example = "Schmidt")]
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn new(profile: profile::Model, email: String) -> Self {
        Self {
            id: profile.id,
            email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Profile changes. Absent fields are left unchanged.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "Anna")]
    pub first_name: Option<String>,
    #[schema(example = "Schmidt")]
    pub last_name: Option<String>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(first) = &payload.first_name {
        validate_required_text(first, "Der Vorname", MAX_NAME_LEN)?;
    }
    if let Some(last) = &payload.last_name {
        validate_required_text(last, "Der Nachname", MAX_NAME_LEN)?;
    }
    Ok(())
}
