use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,

    /// Storage ceiling in bytes. Zero or negative means unlimited.
    pub quota_bytes: i64,

    #[sea_orm(has_many)]
    pub files: HasMany<super::file::Entity>,

    #[sea_orm(has_many)]
    pub folders: HasMany<super::folder::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
