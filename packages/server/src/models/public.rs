use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{FilterParams, Pagination};
use crate::catalog::{FileFilter, PublicFile};
use crate::error::AppError;

/// A publicly shared file as shown in the gallery.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicFileResponse {
    pub id: String,
    pub filename: String,
    pub size: i64,
    pub media_type: String,
    pub tags: Vec<String>,
    pub download_count: i64,
    pub uploaded_at: DateTime<Utc>,
    pub uploader: UploaderResponse,
    /// Token for `GET /public/shares/{token}`.
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploaderResponse {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

impl From<PublicFile> for PublicFileResponse {
    fn from(p: PublicFile) -> Self {
        let PublicFile {
            file,
            blob,
            uploader,
            share,
        } = p;
        Self {
            id: file.id.to_string(),
            filename: file.filename_original,
            size: file.size_original,
            media_type: file.declared_type.unwrap_or(blob.media_type),
            tags: serde_json::from_value(file.tags).unwrap_or_default(),
            download_count: file.download_count,
            uploaded_at: file.uploaded_at,
            uploader: UploaderResponse {
                id: uploader.id.to_string(),
                name: uploader.name,
                email: uploader.email,
            },
            token: share.token,
            expires_at: share.expires_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicListResponse {
    pub data: Vec<PublicFileResponse>,
    pub pagination: Pagination,
}

/// Query parameters for the public gallery.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PublicListQuery {
    pub page: Option<u64>,
    pub search: Option<String>,
    pub media_types: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub tags: Option<String>,
    pub uploaded_from: Option<DateTime<Utc>>,
    pub uploaded_to: Option<DateTime<Utc>>,
    /// Substring of the uploader's name or email.
    pub uploader: Option<String>,
    pub uploader_id: Option<String>,
}

impl PublicListQuery {
    pub fn filter(&self) -> Result<FileFilter, AppError> {
        let mut filter = FilterParams {
            search: self.search.as_deref(),
            media_types: self.media_types.as_deref(),
            min_size: self.min_size,
            max_size: self.max_size,
            tags: self.tags.as_deref(),
            uploaded_from: self.uploaded_from,
            uploaded_to: self.uploaded_to,
        }
        .into_filter()?;

        filter.uploader = self
            .uploader
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        filter.uploader_id = self
            .uploader_id
            .as_deref()
            .map(|id| {
                id.parse()
                    .map_err(|_| AppError::Validation("uploader_id must be a UUID".into()))
            })
            .transpose()?;
        Ok(filter)
    }
}
