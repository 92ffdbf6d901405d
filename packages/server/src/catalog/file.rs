use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use uuid::Uuid;

use super::filter::{FileFilter, publicly_shared};
use crate::entity::share::TargetType;
use crate::entity::{blob, file, share, user};

/// A live file together with the blob holding its bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FileWithBlob {
    pub file: file::Model,
    pub blob: blob::Model,
}

/// A publicly listed file with its uploader and the share that exposes it.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicFile {
    pub file: file::Model,
    pub blob: blob::Model,
    pub uploader: user::Model,
    pub share: share::Model,
}

/// Attributes of a file entry to create.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub owner_id: Uuid,
    pub blob_id: Uuid,
    pub filename: String,
    pub declared_type: Option<String>,
    pub size: i64,
    pub tags: Vec<String>,
}

/// Storage consumed by one owner's live files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerUsage {
    /// Sum of every live file's size.
    pub original: i64,
    /// Sum of the sizes of the distinct blobs those files reference.
    pub dedup: i64,
}

/// Lowercased form of a filename used for search.
pub fn normalize_filename(name: &str) -> String {
    name.to_lowercase()
}

/// Row offset of a 1-based page. `None` when the page lies beyond any
/// offset PostgreSQL accepts.
fn page_offset(page: u64, per_page: u64) -> Option<u64> {
    page.saturating_sub(1)
        .checked_mul(per_page)
        .filter(|offset| *offset <= i64::MAX as u64)
}

fn pair_with_blobs(rows: Vec<(file::Model, Option<blob::Model>)>) -> Vec<FileWithBlob> {
    rows.into_iter()
        .filter_map(|(file, blob)| blob.map(|blob| FileWithBlob { file, blob }))
        .collect()
}

pub struct FileCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FileCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, new: NewFile) -> Result<file::Model, DbErr> {
        let model = file::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_id: Set(new.owner_id),
            blob_id: Set(Some(new.blob_id)),
            filename_normalized: Set(normalize_filename(&new.filename)),
            filename_original: Set(new.filename),
            declared_type: Set(new.declared_type),
            size_original: Set(new.size),
            uploaded_at: Set(Utc::now()),
            is_deleted: Set(false),
            tags: Set(serde_json::json!(new.tags)),
            download_count: Set(0),
        };
        model.insert(self.conn).await
    }

    /// A live file owned by `owner_id`.
    pub async fn find_owned(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<FileWithBlob>, DbErr> {
        let row = file::Entity::find_by_id(file_id)
            .filter(file::Column::OwnerId.eq(owner_id))
            .filter(file::Column::IsDeleted.eq(false))
            .find_also_related(blob::Entity)
            .one(self.conn)
            .await?;
        Ok(row.and_then(|(file, blob)| blob.map(|blob| FileWithBlob { file, blob })))
    }

    /// The live file a share token points at, regardless of owner.
    ///
    /// Only the token and its expiry are checked; visibility does not matter,
    /// so PRIVATE shares work as unlisted links.
    pub async fn find_by_share_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<FileWithBlob>, DbErr> {
        if token.is_empty() {
            return Ok(None);
        }

        let row = file::Entity::find()
            .filter(file::Column::IsDeleted.eq(false))
            .filter(
                file::Column::Id.in_subquery(
                    SeaQuery::select()
                        .column(share::Column::TargetId)
                        .from(share::Entity)
                        .and_where(share::Column::TargetType.eq(TargetType::File))
                        .and_where(share::Column::Token.eq(token))
                        .cond_where(
                            Condition::any()
                                .add(share::Column::ExpiresAt.is_null())
                                .add(share::Column::ExpiresAt.gt(now)),
                        )
                        .to_owned(),
                ),
            )
            .find_also_related(blob::Entity)
            .one(self.conn)
            .await?;
        Ok(row.and_then(|(file, blob)| blob.map(|blob| FileWithBlob { file, blob })))
    }

    /// Soft-delete a live file owned by `owner_id`.
    ///
    /// Exactly one caller can flip a given file, so the returned model is the
    /// signal to release its blob reference. `None` if the file is missing,
    /// not owned, or already deleted.
    pub async fn mark_deleted(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<file::Model>, DbErr> {
        let result = file::Entity::update_many()
            .col_expr(file::Column::IsDeleted, Expr::value(true))
            .filter(file::Column::Id.eq(file_id))
            .filter(file::Column::OwnerId.eq(owner_id))
            .filter(file::Column::IsDeleted.eq(false))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        file::Entity::find_by_id(file_id).one(self.conn).await
    }

    /// Bump the download counter. Returns `false` if the file is gone.
    pub async fn increment_download_count(&self, file_id: Uuid) -> Result<bool, DbErr> {
        let result = file::Entity::update_many()
            .col_expr(
                file::Column::DownloadCount,
                Expr::cust(r#""download_count" + 1"#),
            )
            .filter(file::Column::Id.eq(file_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Live files of one owner, newest first, plus the total match count.
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        filter: &FileFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<FileWithBlob>, u64), DbErr> {
        let select = file::Entity::find()
            .filter(file::Column::OwnerId.eq(owner_id))
            .filter(file::Column::IsDeleted.eq(false))
            .filter(filter.file_condition());

        let total = select.clone().count(self.conn).await?;
        let Some(offset) = page_offset(page, per_page) else {
            return Ok((Vec::new(), total));
        };

        let rows = select
            .order_by_desc(file::Column::UploadedAt)
            .order_by_desc(file::Column::Id)
            .offset(offset)
            .limit(per_page)
            .find_also_related(blob::Entity)
            .all(self.conn)
            .await?;

        Ok((pair_with_blobs(rows), total))
    }

    /// Publicly shared live files across all owners, newest first.
    pub async fn list_public(
        &self,
        filter: &FileFilter,
        now: DateTime<Utc>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<PublicFile>, u64), DbErr> {
        let select = file::Entity::find()
            .filter(file::Column::IsDeleted.eq(false))
            .filter(publicly_shared(now))
            .filter(filter.file_condition())
            .filter(filter.uploader_condition());

        let total = select.clone().count(self.conn).await?;
        let Some(offset) = page_offset(page, per_page) else {
            return Ok((Vec::new(), total));
        };

        let rows = select
            .order_by_desc(file::Column::UploadedAt)
            .order_by_desc(file::Column::Id)
            .offset(offset)
            .limit(per_page)
            .find_also_related(blob::Entity)
            .all(self.conn)
            .await?;
        let files = pair_with_blobs(rows);

        let owner_ids: Vec<Uuid> = files.iter().map(|f| f.file.owner_id).collect();
        let file_ids: Vec<Uuid> = files.iter().map(|f| f.file.id).collect();

        let uploaders: HashMap<Uuid, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(owner_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut shares: HashMap<Uuid, share::Model> = share::Entity::find()
            .filter(share::Column::TargetType.eq(TargetType::File))
            .filter(share::Column::TargetId.is_in(file_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|s| (s.target_id, s))
            .collect();

        let entries = files
            .into_iter()
            .filter_map(|FileWithBlob { file, blob }| {
                let uploader = uploaders.get(&file.owner_id)?.clone();
                let share = shares.remove(&file.id)?;
                Some(PublicFile {
                    file,
                    blob,
                    uploader,
                    share,
                })
            })
            .collect();

        Ok((entries, total))
    }

    /// Original and deduplicated usage for one owner.
    pub async fn usage(&self, owner_id: Uuid) -> Result<OwnerUsage, DbErr> {
        let row = self
            .conn
            .query_one_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"SELECT
                     (SELECT COALESCE(SUM(f."size_original"), 0) FROM "file" f
                       WHERE f."owner_id" = $1 AND NOT f."is_deleted")::BIGINT AS "original",
                     (SELECT COALESCE(SUM(b."size"), 0) FROM "blob" b
                       WHERE b."id" IN (SELECT f."blob_id" FROM "file" f
                                         WHERE f."owner_id" = $1 AND NOT f."is_deleted"))::BIGINT AS "dedup""#,
                [owner_id.into()],
            ))
            .await?;

        match row {
            Some(row) => Ok(OwnerUsage {
                original: row.try_get("", "original")?,
                dedup: row.try_get("", "dedup")?,
            }),
            None => Ok(OwnerUsage::default()),
        }
    }
}
