use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub owner_id: Uuid,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// Null only after the blob row has been purged, which happens once
    /// every file referencing it is soft-deleted.
    pub blob_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "blob_id", to = "id", on_delete = "SetNull")]
    pub blob: HasOne<super::blob::Entity>,

    pub filename_original: String,
    /// Lowercased name used for search.
    pub filename_normalized: String,
    /// Media type the client sent with the upload, if any.
    pub declared_type: Option<String>,
    /// Payload size captured at upload time.
    pub size_original: i64,

    pub uploaded_at: DateTimeUtc,
    pub is_deleted: bool,

    /// JSON array of tag strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    pub download_count: i64,
}

impl ActiveModelBehavior for ActiveModel {}
