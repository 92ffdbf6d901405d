use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blob")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// SHA-256 content digest, lowercase hex.
    #[sea_orm(unique)]
    pub digest: String,

    /// Size of the payload in bytes.
    pub size: i64,

    /// Media type resolved at first upload.
    pub media_type: String,

    /// Object store key, derived from the digest.
    pub storage_key: String,

    /// Number of live files pointing at this blob.
    pub ref_count: i32,

    #[sea_orm(has_many)]
    pub files: HasMany<super::file::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
