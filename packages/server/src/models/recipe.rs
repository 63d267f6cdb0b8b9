use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::entity::{category, ingredient, profile, recipe};
use crate::error::AppError;
use crate::models::category::CategoryResponse;
use crate::models::ingredient::{IngredientInput, IngredientResponse};
use crate::models::shared::{double_option, validate_optional_text, validate_required_text};
use crate::utils::ingredient_editor::IngredientDraft;
use crate::utils::recipe_filter::RecipeFilter;

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2_000;
const MAX_INSTRUCTIONS_LEN: usize = 20_000;
const MAX_IMAGE_URL_LEN: usize = 2_048;
const MAX_SERVINGS: i32 = 1_000;

/// Recipe list filter. Every parameter is optional; empty values match everything.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Case-insensitive substring of the recipe name.
    pub name: Option<String>,
    /// Category id; empty means any category.
    #[param(value_type = Option<String>, example = "2")]
    pub category_id: Option<String>,
    /// Case-insensitive substring of at least one ingredient name.
    pub ingredient: Option<String>,
}

impl RecipeListQuery {
    pub fn into_filter(self) -> Result<RecipeFilter, AppError> {
        let category_id = match self.category_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
                AppError::Validation(format!("Ungültige Kategorie: {raw}"))
            })?),
        };
        Ok(RecipeFilter {
            name: self.name.unwrap_or_default(),
            category_id,
            ingredient: self.ingredient.unwrap_or_default(),
        })
    }
}

fn default_servings() -> i32 {
    1
}

/// Request body for creating a recipe together with its ingredients.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRecipeRequest {
    #[schema(example = "Nudelsalat")]
    pub name: String,
    #[schema(example = "Der Klassiker für jede Grillparty")]
    pub description: Option<String>,
    /// Number of servings (at least 1, default 1).
    #[serde(default = "default_servings")]
    #[schema(example = 4)]
    pub servings: i32,
    pub instructions: Option<String>,
    #[schema(example = 2)]
    pub category_id: i32,
    /// Public URL returned by the image upload.
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

pub fn validate_create_recipe(payload: &CreateRecipeRequest) -> Result<(), AppError> {
    validate_required_text(&payload.name, "Der Name", MAX_NAME_LEN)?;
    validate_optional_text(payload.description.as_deref(), "Die Beschreibung", MAX_DESCRIPTION_LEN)?;
    validate_optional_text(payload.instructions.as_deref(), "Die Anleitung", MAX_INSTRUCTIONS_LEN)?;
    validate_optional_text(payload.image_url.as_deref(), "Die Bild-URL", MAX_IMAGE_URL_LEN)?;
    validate_servings(payload.servings)
}

/// Partial recipe update. Absent fields are left unchanged; `ingredients`,
/// when present, replaces the whole stored list.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub servings: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub instructions: Option<Option<String>>,
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub ingredients: Option<Vec<IngredientInput>>,
}

pub fn validate_update_recipe(payload: &UpdateRecipeRequest) -> Result<(), AppError> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "Der Name", MAX_NAME_LEN)?;
    }
    validate_optional_text(
        payload.description.as_ref().and_then(|d| d.as_deref()),
        "Die Beschreibung",
        MAX_DESCRIPTION_LEN,
    )?;
    validate_optional_text(
        payload.instructions.as_ref().and_then(|i| i.as_deref()),
        "Die Anleitung",
        MAX_INSTRUCTIONS_LEN,
    )?;
    validate_optional_text(
        payload.image_url.as_ref().and_then(|u| u.as_deref()),
        "Die Bild-URL",
        MAX_IMAGE_URL_LEN,
    )?;
    if let Some(servings) = payload.servings {
        validate_servings(servings)?;
    }
    Ok(())
}

fn validate_servings(servings: i32) -> Result<(), AppError> {
    if !(1..=MAX_SERVINGS).contains(&servings) {
        return Err(AppError::Validation(format!(
            "Die Portionen müssen zwischen 1 und {MAX_SERVINGS} liegen"
        )));
    }
    Ok(())
}

/// Recipe card used by the list and home pages.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeSummary {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Nudelsalat")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 4)]
    pub servings: i32,
    pub image_url: Option<String>,
    #[schema(example = 4.5)]
    pub rating: f64,
    pub category_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&recipe::Model> for RecipeSummary {
    fn from(m: &recipe::Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            description: m.description.clone(),
            servings: m.servings,
            image_url: m.image_url.clone(),
            rating: m.rating,
            category_id: m.category_id,
            user_id: m.user_id,
            created_at: m.created_at,
        }
    }
}

/// Filtered recipe list plus the categories offered by the filter form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeSummary>,
    pub categories: Vec<CategoryResponse>,
    #[schema(example = 12)]
    pub total: u64,
}

/// A recipe with its ingredients, as returned after a write.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub servings: i32,
    pub instructions: Option<String>,
    pub image_url: Option<String>,
    pub rating: f64,
    pub category_id: i32,
    pub user_id: i32,
    pub ingredients: Vec<IngredientResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeResponse {
    pub fn new(m: recipe::Model, ingredients: Vec<ingredient::Model>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            servings: m.servings,
            instructions: m.instructions,
            image_url: m.image_url,
            rating: m.rating,
            category_id: m.category_id,
            user_id: m.user_id,
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Author names shown on the detail page.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AuthorResponse {
    pub user_id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AuthorResponse {
    pub fn new(user_id: i32, profile: Option<profile::Model>) -> Self {
        let (first_name, last_name) = profile
            .map(|p| (p.first_name, p.last_name))
            .unwrap_or_default();
        Self {
            user_id,
            first_name,
            last_name,
        }
    }
}

/// Recipe detail with category, author and ingredients embedded.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeDetailResponse {
    #[serde(flatten)]
    pub recipe: RecipeResponse,
    pub category: Option<CategoryResponse>,
    pub author: AuthorResponse,
    /// Whether the caller may edit or delete this recipe.
    pub is_owner: bool,
}

impl RecipeDetailResponse {
    pub fn new(
        recipe: recipe::Model,
        ingredients: Vec<ingredient::Model>,
        category: Option<category::Model>,
        author: Option<profile::Model>,
        caller: Option<i32>,
    ) -> Self {
        let is_owner = caller == Some(recipe.user_id);
        let author = AuthorResponse::new(recipe.user_id, author);
        Self {
            recipe: RecipeResponse::new(recipe, ingredients),
            category: category.map(Into::into),
            author,
            is_owner,
        }
    }
}

/// Data for the create form: the categories and one blank ingredient.
#[derive(Serialize, utoipa::ToSchema)]
pub struct NewRecipeFormResponse {
    pub categories: Vec<CategoryResponse>,
    pub ingredients: Vec<IngredientDraft>,
}

/// Data for the edit form.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EditRecipeFormResponse {
    pub recipe: RecipeResponse,
    pub categories: Vec<CategoryResponse>,
}
