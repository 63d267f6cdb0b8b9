use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredient")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub recipe_id: i32,
    #[sea_orm(belongs_to, from = "recipe_id", to = "id")]
    pub recipe: HasOne<super::recipe::Entity>,

    /// 0-based order within the recipe.
    pub position: i32,

    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub additional_info: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
