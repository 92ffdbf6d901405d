use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::FileFilter;
use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 200)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 1)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page.max(1)),
        }
    }
}

/// Split a comma-separated query value into trimmed, non-empty entries.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Filter fields shared by the owner and public listings.
pub struct FilterParams<'a> {
    pub search: Option<&'a str>,
    pub media_types: Option<&'a str>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub tags: Option<&'a str>,
    pub uploaded_from: Option<DateTime<Utc>>,
    pub uploaded_to: Option<DateTime<Utc>>,
}

impl FilterParams<'_> {
    pub fn into_filter(self) -> Result<FileFilter, AppError> {
        if self.min_size.is_some_and(|s| s < 0) || self.max_size.is_some_and(|s| s < 0) {
            return Err(AppError::Validation("Size bounds must be >= 0".into()));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size)
            && min > max
        {
            return Err(AppError::Validation(
                "min_size must not exceed max_size".into(),
            ));
        }
        if let (Some(from), Some(to)) = (self.uploaded_from, self.uploaded_to)
            && from > to
        {
            return Err(AppError::Validation(
                "uploaded_from must not be after uploaded_to".into(),
            ));
        }

        Ok(FileFilter {
            search: self.search.map(str::to_string),
            media_types: split_list(self.media_types),
            min_size: self.min_size,
            max_size: self.max_size,
            tags: split_list(self.tags),
            uploaded_from: self.uploaded_from,
            uploaded_to: self.uploaded_to,
            uploader: None,
            uploader_id: None,
        })
    }
}
