pub mod file;
pub mod folder;
pub mod health;
pub mod public;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::Response;
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::filename::content_disposition_value;
use crate::vault::Download;

/// Parse a UUID path or query segment, naming `what` in the error.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {what} ID")))
}

/// Turn fetched bytes into a download response.
///
/// The ETag is the content digest, so identical content shares a tag
/// across files and owners.
pub(crate) fn download_response(download: Download) -> Result<Response, AppError> {
    let Download {
        file,
        blob,
        data,
        content_type,
    } = download;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&file.filename_original),
        )
        .header(header::ETAG, format!("\"{}\"", blob.digest))
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
