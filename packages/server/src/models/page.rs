use serde::Serialize;

use crate::models::recipe::RecipeSummary;

/// Home page highlights.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeResponse {
    /// Best rated recipes.
    pub popular: Vec<RecipeSummary>,
    /// Most recently created recipes.
    pub newest: Vec<RecipeSummary>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AboutResponse {
    #[schema(example = "Rezepte")]
    pub name: &'static str,
    pub description: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}
