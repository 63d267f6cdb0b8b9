use std::collections::HashSet;

use crate::entity::{ingredient, recipe};

/// Criteria of the recipe list. Empty strings and `None` match everything.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub name: String,
    pub category_id: Option<i32>,
    pub ingredient: String,
}

impl RecipeFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.category_id.is_none() && self.ingredient.is_empty()
    }
}

/// Recipes satisfying every criterion, in input order.
///
/// A recipe passes a non-empty ingredient criterion when at least one of its
/// ingredients contains the text.
pub fn filter_recipes<'a>(
    recipes: &'a [recipe::Model],
    ingredients: &[ingredient::Model],
    filter: &RecipeFilter,
) -> Vec<&'a recipe::Model> {
    let name = filter.name.to_lowercase();
    let ingredient_text = filter.ingredient.to_lowercase();

    let with_matching_ingredient: HashSet<i32> = ingredients
        .iter()
        .filter(|i| i.name.to_lowercase().contains(&ingredient_text))
        .map(|i| i.recipe_id)
        .collect();

    recipes
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&name))
        .filter(|r| filter.category_id.is_none_or(|c| r.category_id == c))
        .filter(|r| ingredient_text.is_empty() || with_matching_ingredient.contains(&r.id))
        .collect()
}
