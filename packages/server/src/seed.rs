use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{category, ingredient, recipe, session};

/// Categories offered on a fresh installation.
const DEFAULT_CATEGORIES: &[&str] = &[
    "Vorspeise",
    "Hauptgericht",
    "Beilage",
    "Salat",
    "Suppe",
    "Dessert",
    "Backen",
    "Getränk",
];

/// Seed the `category` table with defaults. Existing categories are kept.
pub async fn seed_categories(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &name in DEFAULT_CATEGORIES {
        let model = category::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = category::Entity::insert(model)
            .on_conflict(
                OnConflict::column(category::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new categories", inserted);
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        // Recipe list and home page: ORDER BY created_at DESC
        (
            "idx_recipe_created",
            Index::create()
                .if_not_exists()
                .name("idx_recipe_created")
                .table(recipe::Entity)
                .col(recipe::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
        // Ingredients of one recipe in list order
        (
            "idx_ingredient_recipe_position",
            Index::create()
                .if_not_exists()
                .name("idx_ingredient_recipe_position")
                .table(ingredient::Entity)
                .col(ingredient::Column::RecipeId)
                .col(ingredient::Column::Position)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_session_user",
            Index::create()
                .if_not_exists()
                .name("idx_session_user")
                .table(session::Entity)
                .col(session::Column::UserId)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in indexes {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
