use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    Statement, TryIntoModel,
};
use tracing::error;
use uuid::Uuid;

use crate::entity::blob;

/// Attributes of a blob that is about to be cataloged for the first time.
#[derive(Debug, Clone)]
pub struct NewBlob {
    pub digest: String,
    pub size: i64,
    pub media_type: String,
    pub storage_key: String,
}

pub struct BlobCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> BlobCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<blob::Model>, DbErr> {
        blob::Entity::find_by_id(id).one(self.conn).await
    }

    /// Exact-match lookup. `None` means the content is novel.
    pub async fn find_by_digest(&self, digest: &str) -> Result<Option<blob::Model>, DbErr> {
        blob::Entity::find()
            .filter(blob::Column::Digest.eq(digest))
            .one(self.conn)
            .await
    }

    /// Catalog a new blob with a reference count of one.
    ///
    /// Returns `None` when another writer cataloged the same digest first;
    /// the caller should look the blob up again and take a reference to it.
    pub async fn insert(&self, new: NewBlob) -> Result<Option<blob::Model>, DbErr> {
        let active = blob::ActiveModel {
            id: Set(Uuid::now_v7()),
            digest: Set(new.digest),
            size: Set(new.size),
            media_type: Set(new.media_type),
            storage_key: Set(new.storage_key),
            ref_count: Set(1),
            created_at: Set(Utc::now()),
        };

        let result = blob::Entity::insert(active.clone())
            .on_conflict(
                OnConflict::column(blob::Column::Digest)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => Ok(None),
            Ok(_) => active.try_into_model().map(Some),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Atomically take one more reference to a live blob.
    ///
    /// Only blobs with a positive count are touched: a blob at zero is being
    /// purged and must not come back. `None` means no live row matched.
    pub async fn increment_ref(&self, id: Uuid) -> Result<Option<blob::Model>, DbErr> {
        blob::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "blob" SET "ref_count" = "ref_count" + 1
                   WHERE "id" = $1 AND "ref_count" > 0
                   RETURNING *"#,
                [id.into()],
            ))
            .one(self.conn)
            .await
    }

    /// Atomically drop one reference and return the blob with its new count.
    ///
    /// The count never goes below zero. `None` means the blob is missing or
    /// already at zero, which the reference-counting model makes unreachable;
    /// it is logged as an error for the caller to surface.
    pub async fn decrement_ref(&self, id: Uuid) -> Result<Option<blob::Model>, DbErr> {
        let updated = blob::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE "blob" SET "ref_count" = "ref_count" - 1
                   WHERE "id" = $1 AND "ref_count" > 0
                   RETURNING *"#,
                [id.into()],
            ))
            .one(self.conn)
            .await?;

        if updated.is_none() {
            error!(blob_id = %id, "Reference count decrement matched no live blob");
        }
        Ok(updated)
    }

    /// Remove an unreferenced blob row. Rows that regained a reference are
    /// left alone. Purging the stored bytes is the caller's job.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = blob::Entity::delete_many()
            .filter(blob::Column::Id.eq(id))
            .filter(blob::Column::RefCount.lte(0))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
