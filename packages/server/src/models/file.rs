use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{FilterParams, Pagination};
use crate::catalog::{FileFilter, FileWithBlob};
use crate::error::{AppError, ErrorBody};
use crate::vault::{StorageStats, UploadedFile};

/// Response DTO for a single file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    /// File ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Filename as uploaded.
    #[schema(example = "Report.pdf")]
    pub filename: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    /// Effective media type: the declared type, else the detected one.
    #[schema(example = "application/pdf")]
    pub media_type: String,
    /// Media type sent by the client, if any.
    pub declared_type: Option<String>,
    /// SHA-256 content digest.
    #[schema(example = "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4")]
    pub digest: String,
    pub tags: Vec<String>,
    pub download_count: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<FileWithBlob> for FileResponse {
    fn from(FileWithBlob { file, blob }: FileWithBlob) -> Self {
        let tags = serde_json::from_value(file.tags).unwrap_or_default();
        Self {
            id: file.id.to_string(),
            filename: file.filename_original,
            size: file.size_original,
            media_type: file
                .declared_type
                .clone()
                .unwrap_or_else(|| blob.media_type.clone()),
            declared_type: file.declared_type,
            digest: blob.digest,
            tags,
            download_count: file.download_count,
            uploaded_at: file.uploaded_at,
        }
    }
}

/// Outcome of one item of an upload batch.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResult {
    /// Filename as submitted.
    pub filename: String,
    /// Present when the item was stored.
    pub file: Option<FileResponse>,
    /// True if the content was new to the vault.
    pub is_new: Option<bool>,
    /// Number of live files sharing this content, including this one.
    pub ref_count: Option<i32>,
    /// Present when the item was rejected.
    pub error: Option<ErrorBody>,
}

impl UploadResult {
    pub fn stored(filename: String, uploaded: UploadedFile) -> Self {
        let ref_count = uploaded.blob.ref_count;
        Self {
            filename,
            is_new: Some(uploaded.is_new),
            ref_count: Some(ref_count),
            file: Some(FileResponse::from(FileWithBlob {
                file: uploaded.file,
                blob: uploaded.blob,
            })),
            error: None,
        }
    }

    pub fn failed(filename: String, error: AppError) -> Self {
        Self {
            filename,
            file: None,
            is_new: None,
            ref_count: None,
            error: Some(error.into_body()),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub results: Vec<UploadResult>,
    /// Number of items stored.
    pub stored: usize,
    /// Number of items rejected.
    pub failed: usize,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub data: Vec<FileResponse>,
    pub pagination: Pagination,
}

/// Query parameters for listing the caller's files.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct FileListQuery {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Substring of the filename, case-insensitive.
    pub search: Option<String>,
    /// Comma-separated media types; `image/*` or `image/` matches a family.
    pub media_types: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    /// Comma-separated tags that must all be present.
    pub tags: Option<String>,
    pub uploaded_from: Option<DateTime<Utc>>,
    pub uploaded_to: Option<DateTime<Utc>>,
}

impl FileListQuery {
    pub fn filter(&self) -> Result<FileFilter, AppError> {
        FilterParams {
            search: self.search.as_deref(),
            media_types: self.media_types.as_deref(),
            min_size: self.min_size,
            max_size: self.max_size,
            tags: self.tags.as_deref(),
            uploaded_from: self.uploaded_from,
            uploaded_to: self.uploaded_to,
        }
        .into_filter()
    }
}

/// Storage usage of the caller.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StorageStatsResponse {
    /// Sum of the sizes of all live files.
    #[schema(example = 300)]
    pub original_bytes: i64,
    /// Bytes actually stored for those files after deduplication.
    #[schema(example = 100)]
    pub dedup_bytes: i64,
    #[schema(example = 200)]
    pub savings_bytes: i64,
    #[schema(example = 66.67)]
    pub savings_percent: f64,
    /// Quota ceiling; zero or negative means unlimited.
    #[schema(example = 10485760)]
    pub quota_bytes: i64,
}

impl From<StorageStats> for StorageStatsResponse {
    fn from(stats: StorageStats) -> Self {
        Self {
            original_bytes: stats.original_bytes,
            dedup_bytes: stats.dedup_bytes,
            savings_bytes: stats.savings_bytes,
            savings_percent: stats.savings_percent,
            quota_bytes: stats.quota_bytes,
        }
    }
}
