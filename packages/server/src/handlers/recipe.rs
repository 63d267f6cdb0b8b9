use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, ingredient, profile, recipe};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::extractors::json::AppJson;
use crate::handlers::category::{all_categories, require_category};
use crate::models::category::CategoryResponse;
use crate::models::ingredient::{
    IngredientEditRequest, IngredientListResponse, IngredientResponse, validate_ingredients,
};
use crate::models::recipe::{
    CreateRecipeRequest, EditRecipeFormResponse, NewRecipeFormResponse, RecipeDetailResponse,
    RecipeListQuery, RecipeListResponse, RecipeResponse, RecipeSummary, UpdateRecipeRequest,
    validate_create_recipe, validate_update_recipe,
};
use crate::models::shared::normalize_optional;
use crate::state::AppState;
use crate::utils::ingredient_editor::{IngredientDraft, IngredientList};
use crate::utils::ingredients::{list_ingredients, replace_ingredients};
use crate::utils::recipe_filter::filter_recipes;

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List recipes with filters",
    description = "Returns every recipe (newest first) whose name contains `name`, whose category is `category_id` \
        and which has an ingredient containing `ingredient`. Text matching is case-insensitive; empty parameters match everything. \
        The categories for the filter form are included. Not paginated.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Filtered recipes", body = RecipeListResponse),
        (status = 400, description = "Invalid category id (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let filter = query.into_filter()?;

    let (recipes, ingredients, categories) = tokio::try_join!(
        recipe::Entity::find()
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .all(&state.db),
        ingredient::Entity::find().all(&state.db),
        all_categories(&state.db),
    )?;

    let matching: Vec<RecipeSummary> = filter_recipes(&recipes, &ingredients, &filter)
        .into_iter()
        .map(RecipeSummary::from)
        .collect();

    tracing::debug!(
        total = recipes.len(),
        matching = matching.len(),
        "Filtered recipe list"
    );

    Ok(Json(RecipeListResponse {
        total: matching.len() as u64,
        recipes: matching,
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe with its details",
    description = "Returns the recipe with category, author names and ingredients in list order. \
        Authentication is optional; `is_owner` tells a signed-in caller whether they may edit the recipe.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetailResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(id))]
pub async fn get_recipe(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let recipe = find_recipe(&state.db, id).await?;

    let (ingredients, category, author) = tokio::try_join!(
        list_ingredients(&state.db, id),
        category::Entity::find_by_id(recipe.category_id).one(&state.db),
        profile::Entity::find_by_id(recipe.user_id).one(&state.db),
    )?;

    Ok(Json(RecipeDetailResponse::new(
        recipe,
        ingredients,
        category,
        author,
        caller.user_id(),
    )))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates the recipe and its ingredients in one transaction. The caller becomes the owner. \
        Ingredients are stored in the submitted order.",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_recipe(&payload)?;
    let drafts: Vec<IngredientDraft> = payload.ingredients.into_iter().map(Into::into).collect();
    validate_ingredients(&drafts)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    require_category(&txn, payload.category_id).await?;

    let recipe = recipe::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(normalize_optional(payload.description)),
        servings: Set(payload.servings),
        instructions: Set(normalize_optional(payload.instructions)),
        image_url: Set(normalize_optional(payload.image_url)),
        rating: Set(0.0),
        category_id: Set(payload.category_id),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let ingredients = replace_ingredients(&txn, recipe.id, &drafts).await?;

    txn.commit().await?;

    tracing::info!(recipe_id = recipe.id, ingredients = ingredients.len(), "Recipe created");
    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse::new(recipe, ingredients)),
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Updates the provided fields. When `ingredients` is present, every stored ingredient is replaced by the \
        submitted list inside the same transaction; when absent, the stored list is kept. Owner only.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    validate_update_recipe(&payload)?;
    let drafts: Option<Vec<IngredientDraft>> = payload
        .ingredients
        .map(|list| list.into_iter().map(Into::into).collect());
    if let Some(drafts) = &drafts {
        validate_ingredients(drafts)?;
    }

    let txn = state.db.begin().await?;

    let existing = find_recipe_for_update(&txn, id).await?;
    auth_user.require_owner(&existing)?;

    if let Some(category_id) = payload.category_id {
        require_category(&txn, category_id).await?;
    }

    let mut active = existing.into_active_model();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(normalize_optional(description));
    }
    if let Some(servings) = payload.servings {
        active.servings = Set(servings);
    }
    if let Some(instructions) = payload.instructions {
        active.instructions = Set(normalize_optional(instructions));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(normalize_optional(image_url));
    }
    active.updated_at = Set(Utc::now());
    let recipe = active.update(&txn).await?;

    let ingredients = match &drafts {
        Some(drafts) => replace_ingredients(&txn, id, drafts).await?,
        None => list_ingredients(&txn, id).await?,
    };

    txn.commit().await?;

    tracing::info!(
        recipe_id = id,
        replaced_ingredients = drafts.is_some(),
        "Recipe updated"
    );
    Ok(Json(RecipeResponse::new(recipe, ingredients)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes the recipe's ingredients and then the recipe in one transaction. Owner only.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_recipe_for_update(&txn, id).await?;
    auth_user.require_owner(&existing)?;

    let removed = ingredient::Entity::delete_many()
        .filter(ingredient::Column::RecipeId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    recipe::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(recipe_id = id, ingredients = removed, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/zutaten",
    tag = "Recipes",
    operation_id = "editIngredients",
    summary = "Apply position-keyed edits to a recipe's ingredients",
    description = "Applies `append`, `remove` and `set` operations in order to the stored ingredient list and saves the \
        result, replacing every stored ingredient in one transaction. Positions refer to the list as it is after the \
        preceding edits; removing shifts later entries down. `set` on `quantity` coerces text to a number (0 when not numeric). \
        The edits are rejected as a whole when one is out of range or a resulting ingredient has no name. Owner only.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = IngredientEditRequest,
    responses(
        (status = 200, description = "Saved ingredient list", body = IngredientListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, edits = payload.edits.len()))]
pub async fn edit_ingredients(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<IngredientEditRequest>,
) -> Result<Json<IngredientListResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_recipe_for_update(&txn, id).await?;
    auth_user.require_owner(&existing)?;

    let stored = list_ingredients(&txn, id).await?;
    let mut list: IngredientList = stored
        .into_iter()
        .map(IngredientDraft::from)
        .collect::<Vec<_>>()
        .into();
    list.apply_all(payload.edits)?;
    validate_ingredients(list.as_slice())?;

    let saved = replace_ingredients(&txn, id, list.as_slice()).await?;

    let mut active = existing.into_active_model();
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;

    txn.commit().await?;

    Ok(Json(IngredientListResponse {
        recipe_id: id,
        ingredients: saved.into_iter().map(IngredientResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/bearbeiten",
    tag = "Recipes",
    operation_id = "getRecipeEditForm",
    summary = "Data for the recipe edit form",
    description = "The recipe with its ingredients and all categories. Owner only.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Edit form data", body = EditRecipeFormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn edit_form(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EditRecipeFormResponse>, AppError> {
    let (recipe, ingredients, categories) = tokio::try_join!(
        recipe::Entity::find_by_id(id).one(&state.db),
        list_ingredients(&state.db, id),
        all_categories(&state.db),
    )?;

    let recipe = recipe.ok_or_else(recipe_not_found)?;
    auth_user.require_owner(&recipe)?;

    Ok(Json(EditRecipeFormResponse {
        recipe: RecipeResponse::new(recipe, ingredients),
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Recipes",
    operation_id = "getNewRecipeForm",
    summary = "Data for the recipe create form",
    description = "All categories and an ingredient list holding one blank entry.",
    responses(
        (status = 200, description = "Create form data", body = NewRecipeFormResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn new_recipe_form(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<NewRecipeFormResponse>, AppError> {
    let categories = all_categories(&state.db).await?;
    Ok(Json(NewRecipeFormResponse {
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
        ingredients: IngredientList::with_blank().into_vec(),
    }))
}

fn recipe_not_found() -> AppError {
    AppError::NotFound("Rezept nicht gefunden".into())
}

async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(recipe_not_found)
}

/// Load a recipe and lock its row until the surrounding transaction ends,
/// serializing concurrent writes to the same recipe.
async fn find_recipe_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<recipe::Model, AppError> {
    use sea_orm::sea_query::LockType;
    recipe::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(recipe_not_found)
}
