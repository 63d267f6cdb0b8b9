use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::page::home))
        .routes(routes!(handlers::page::about))
        .nest("/auth", auth_routes())
        .nest("/profil", profile_routes())
        .nest("/kategorien", category_routes())
        .nest("/rezepte", recipe_routes())
        .nest("/neues-rezept", new_recipe_routes())
        .nest("/bilder", image_routes(config))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::get_session))
        .routes(routes!(handlers::auth::session_events))
}

fn profile_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::profile::get_profile,
        handlers::profile::update_profile
    ))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::category::list_categories))
}

fn recipe_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::recipe::list_recipes,
            handlers::recipe::create_recipe
        ))
        .routes(routes!(
            handlers::recipe::get_recipe,
            handlers::recipe::update_recipe,
            handlers::recipe::delete_recipe
        ))
        .routes(routes!(handlers::recipe::edit_ingredients))
        .routes(routes!(handlers::recipe::edit_form))
}

fn new_recipe_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::recipe::new_recipe_form))
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .layer(handlers::image::image_upload_body_limit(
            config.storage.max_image_size,
        ))
}
