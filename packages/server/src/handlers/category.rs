use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::category;
use crate::error::AppError;
use crate::models::category::{CategoryListResponse, CategoryResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List recipe categories",
    description = "Returns all categories ordered by name.",
    responses(
        (status = 200, description = "Categories", body = CategoryListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let categories = all_categories(&state.db).await?;
    Ok(Json(CategoryListResponse {
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
    }))
}

pub async fn all_categories<C: ConnectionTrait>(db: &C) -> Result<Vec<category::Model>, DbErr> {
    category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
}

/// Ensure a category id refers to an existing category.
pub async fn require_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Kategorie {id} existiert nicht")))
}
