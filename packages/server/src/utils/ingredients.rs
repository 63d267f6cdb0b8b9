use sea_orm::*;

use crate::entity::ingredient;
use crate::utils::ingredient_editor::IngredientDraft;

/// Ingredients of a recipe in list order.
pub async fn list_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
) -> Result<Vec<ingredient::Model>, DbErr> {
    ingredient::Entity::find()
        .filter(ingredient::Column::RecipeId.eq(recipe_id))
        .order_by_asc(ingredient::Column::Position)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await
}

/// Replace every ingredient row of a recipe with `drafts`, stored at
/// positions `0..drafts.len()`.
///
/// Run this on a transaction: on its own the delete and the insert are two
/// separate statements.
pub async fn replace_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    drafts: &[IngredientDraft],
) -> Result<Vec<ingredient::Model>, DbErr> {
    let removed = ingredient::Entity::delete_many()
        .filter(ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?
        .rows_affected;

    if !drafts.is_empty() {
        let rows = drafts.iter().enumerate().map(|(pos, d)| ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            position: Set(pos as i32),
            name: Set(d.name.trim().to_string()),
            quantity: Set(d.quantity),
            unit: Set(d.unit.trim().to_string()),
            additional_info: Set(d
                .additional_info
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)),
            ..Default::default()
        });
        ingredient::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }

    tracing::debug!(
        recipe_id,
        removed,
        inserted = drafts.len(),
        "Replaced ingredients"
    );

    list_ingredients(db, recipe_id).await
}
