use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::share::{TargetType, Visibility};
use crate::entity::{blob, file, share, user};

/// Optional constraints for file listings. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Substring of the normalized filename.
    pub search: Option<String>,
    /// Acceptable media types. Entries ending in `/` or `/*` match a whole
    /// family (`image/`), anything else must match exactly, ignoring
    /// parameters such as `; charset=utf-8`.
    pub media_types: Vec<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    /// Every tag listed must be present on the file.
    pub tags: Vec<String>,
    pub uploaded_from: Option<DateTime<Utc>>,
    pub uploaded_to: Option<DateTime<Utc>>,
    /// Substring of the uploader's name or email. Public listing only.
    pub uploader: Option<String>,
    /// Exact uploader. Public listing only.
    pub uploader_id: Option<Uuid>,
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(&term.to_lowercase()))).escape('\\')
}

/// Match a media type column against one filter entry.
fn media_type_condition<T: ColumnTrait>(column: T, entry: &str) -> Condition {
    let entry = entry.trim().to_lowercase();
    if let Some(family) = entry.strip_suffix("/*").or_else(|| entry.strip_suffix('/')) {
        let pattern = format!("{}/%", escape_like(family));
        Condition::all().add(column.like(LikeExpr::new(pattern).escape('\\')))
    } else {
        let with_params = format!("{};%", escape_like(&entry));
        Condition::any()
            .add(column.eq(entry.clone()))
            .add(column.like(LikeExpr::new(with_params).escape('\\')))
    }
}

impl FileFilter {
    /// Conditions on the file row itself and its blob.
    pub fn file_condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            cond = cond.add(file::Column::FilenameNormalized.like(contains_pattern(search)));
        }

        let media_types: Vec<&str> = self
            .media_types
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect();
        if !media_types.is_empty() {
            // The effective type is the declared one, falling back to the blob's.
            let mut declared = Condition::any();
            let mut detected = Condition::any();
            for entry in &media_types {
                declared = declared.add(media_type_condition(file::Column::DeclaredType, entry));
                detected = detected.add(media_type_condition(blob::Column::MediaType, entry));
            }
            cond = cond.add(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(file::Column::DeclaredType.is_not_null())
                            .add(declared),
                    )
                    .add(
                        Condition::all()
                            .add(file::Column::DeclaredType.is_null())
                            .add(
                                file::Column::BlobId.in_subquery(
                                    SeaQuery::select()
                                        .column(blob::Column::Id)
                                        .from(blob::Entity)
                                        .cond_where(detected)
                                        .to_owned(),
                                ),
                            ),
                    ),
            );
        }

        if let Some(min) = self.min_size {
            cond = cond.add(file::Column::SizeOriginal.gte(min));
        }
        if let Some(max) = self.max_size {
            cond = cond.add(file::Column::SizeOriginal.lte(max));
        }

        let tags: Vec<&str> = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            cond = cond.add(Expr::cust_with_values(
                r#""file"."tags" @> $1::jsonb"#,
                [serde_json::json!(tags)],
            ));
        }

        if let Some(from) = self.uploaded_from {
            cond = cond.add(file::Column::UploadedAt.gte(from));
        }
        if let Some(to) = self.uploaded_to {
            cond = cond.add(file::Column::UploadedAt.lte(to));
        }

        cond
    }

    /// Conditions on the uploader, used by the public listing.
    pub fn uploader_condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(uploader) = self.uploader.as_deref().map(str::trim)
            && !uploader.is_empty()
        {
            let pattern = contains_pattern(uploader);
            cond = cond.add(
                file::Column::OwnerId.in_subquery(
                    SeaQuery::select()
                        .column(user::Column::Id)
                        .from(user::Entity)
                        .cond_where(
                            Condition::any()
                                .add(
                                    Expr::expr(Func::lower(Expr::col(user::Column::Name)))
                                        .like(pattern.clone()),
                                )
                                .add(
                                    Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                                        .like(pattern),
                                ),
                        )
                        .to_owned(),
                ),
            );
        }

        if let Some(uploader_id) = self.uploader_id {
            cond = cond.add(file::Column::OwnerId.eq(uploader_id));
        }

        cond
    }
}

/// Files with a PUBLIC share that has a non-empty token and has not expired.
pub fn publicly_shared(now: DateTime<Utc>) -> Condition {
    Condition::all().add(
        file::Column::Id.in_subquery(
            SeaQuery::select()
                .column(share::Column::TargetId)
                .from(share::Entity)
                .and_where(share::Column::TargetType.eq(TargetType::File))
                .and_where(share::Column::Visibility.eq(Visibility::Public))
                .and_where(share::Column::Token.is_not_null())
                .and_where(share::Column::Token.ne(""))
                .cond_where(
                    Condition::any()
                        .add(share::Column::ExpiresAt.is_null())
                        .add(share::Column::ExpiresAt.gt(now)),
                )
                .to_owned(),
        ),
    )
}
