use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::recipe;
use crate::error::AppError;
use crate::models::page::{AboutResponse, HomeResponse};
use crate::models::recipe::RecipeSummary;
use crate::state::AppState;

/// Number of recipes in each home page section.
const HIGHLIGHT_COUNT: u64 = 3;

#[utoipa::path(
    get,
    path = "/",
    tag = "Pages",
    operation_id = "getHome",
    summary = "Home page highlights",
    description = "The three best rated recipes (ties broken newest first) and the three newest recipes.",
    responses(
        (status = 200, description = "Highlights", body = HomeResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>, AppError> {
    let (popular, newest) = tokio::try_join!(
        recipe::Entity::find()
            .order_by_desc(recipe::Column::Rating)
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .limit(HIGHLIGHT_COUNT)
            .all(&state.db),
        recipe::Entity::find()
            .order_by_desc(recipe::Column::CreatedAt)
            .order_by_desc(recipe::Column::Id)
            .limit(HIGHLIGHT_COUNT)
            .all(&state.db),
    )?;

    Ok(Json(HomeResponse {
        popular: popular.iter().map(RecipeSummary::from).collect(),
        newest: newest.iter().map(RecipeSummary::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/%C3%BCber-uns",
    tag = "Pages",
    operation_id = "getAbout",
    summary = "About the application",
    description = "Served at `/über-uns`; the route is registered percent-encoded as clients send it.",
    responses(
        (status = 200, description = "Application info", body = AboutResponse),
    ),
)]
pub async fn about() -> Json<AboutResponse> {
    Json(AboutResponse {
        name: "Rezepte",
        description: "Rezepte entdecken, teilen und gemeinsam nachkochen.",
        version: env!("CARGO_PKG_VERSION"),
    })
}
