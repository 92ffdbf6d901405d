use axum::Json;
use axum::extract::{Path, State};
use axum::response::Response;
use tracing::instrument;

use super::{download_response, parse_id};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppQuery;
use crate::models::public::{PublicFileResponse, PublicListQuery, PublicListResponse};
use crate::models::shared::Pagination;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/files",
    tag = "Public",
    operation_id = "listPublicFiles",
    summary = "List publicly shared files",
    description = "Files with a live PUBLIC share, newest first. Accepts the same filters as the \
        owner listing plus `uploader` (name or email substring) and `uploader_id`.",
    params(PublicListQuery),
    responses(
        (status = 200, description = "One page of public files", body = PublicListResponse),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_public_files(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PublicListQuery>,
) -> Result<Json<PublicListResponse>, AppError> {
    let filter = query.filter()?;
    let page = query.page.unwrap_or(1).max(1);

    let (files, total) = state.vault.list_public(&filter, page).await?;

    Ok(Json(PublicListResponse {
        data: files.into_iter().map(PublicFileResponse::from).collect(),
        pagination: Pagination::new(page, state.vault.config().page_size, total),
    }))
}

#[utoipa::path(
    get,
    path = "/shares/{token}",
    tag = "Public",
    operation_id = "downloadShared",
    summary = "Download a file through its share token",
    description = "Works for PUBLIC and PRIVATE shares alike. Expired or revoked tokens are \
        reported as not found.",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "Unknown or expired token (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn download_shared(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let download = state
        .vault
        .download_shared(&token)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    download_response(download)
}

#[utoipa::path(
    get,
    path = "/files/{id}/download",
    tag = "Public",
    operation_id = "downloadPublicFile",
    summary = "Download a publicly shared file by ID",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not publicly shared (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_public_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let file_id = parse_id(&id, "file")?;
    let download = state
        .vault
        .download_public(file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    download_response(download)
}
