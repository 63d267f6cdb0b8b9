use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    /// Same value as the owning user's id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(belongs_to, from = "id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
