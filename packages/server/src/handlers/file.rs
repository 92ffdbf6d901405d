use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::GENERIC_MEDIA_TYPE;
use tracing::instrument;

use super::{download_response, parse_id};
use crate::config::VaultConfig;
use crate::entity::share::TargetType;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::file::{
    FileListQuery, FileListResponse, FileResponse, StorageStatsResponse, UploadResponse,
    UploadResult,
};
use crate::models::share::{ShareBody, ShareResponse};
use crate::models::shared::{Pagination, split_list};
use crate::state::AppState;
use crate::vault::UploadItem;

/// Most files accepted in one upload request.
pub const MAX_FILES_PER_UPLOAD: usize = 32;

/// Multipart overhead allowed on top of the file payloads.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn upload_body_limit(config: &VaultConfig) -> DefaultBodyLimit {
    let Some(per_file) = config.upload_limit() else {
        return DefaultBodyLimit::disable();
    };
    let limit = per_file
        .saturating_add(1)
        .saturating_mul(MAX_FILES_PER_UPLOAD as u64)
        .saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Read a multipart field into memory, keeping at most `cap` bytes.
///
/// Anything past the cap is left unread; the vault only needs to see that
/// the payload is over its limit.
async fn read_capped(mut field: Field<'_>, cap: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?
    {
        let room = cap - data.len();
        data.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if data.len() >= cap {
            break;
        }
    }
    Ok(data)
}

/// The client's type for a part: the part header unless it is the generic
/// fallback, then a guess from the extension.
fn declared_type(part_type: Option<&str>, filename: &str) -> Option<String> {
    part_type
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != GENERIC_MEDIA_TYPE)
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(filename).first().map(|m| m.to_string()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFiles",
    summary = "Upload one or more files",
    description = "Each `file` multipart field is stored as a separate file. An optional `tags` \
        field (comma-separated) applies to every file of the request. Items succeed or fail \
        independently: the response lists a result per file. Identical content is stored once \
        and shared between files.",
    request_body(content_type = "multipart/form-data", description = "Files with optional tags"),
    responses(
        (status = 201, description = "At least one file stored", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "Every file was too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 507, description = "Every file exceeded the quota (QUOTA_EXCEEDED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(owner_id = %auth_user.user_id))]
pub async fn upload_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let cap = state
        .vault
        .config()
        .upload_limit()
        .and_then(|limit| usize::try_from(limit.saturating_add(1)).ok())
        .unwrap_or(usize::MAX);

    let mut items = Vec::new();
    let mut tags = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                if items.len() == MAX_FILES_PER_UPLOAD {
                    return Err(AppError::Validation(format!(
                        "At most {MAX_FILES_PER_UPLOAD} files per upload"
                    )));
                }
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
                let declared = declared_type(field.content_type(), &filename);
                let data = read_capped(field, cap).await?;

                let mut item = UploadItem::from_bytes(filename, data);
                if let Some(declared) = declared {
                    item = item.with_declared_type(declared);
                }
                items.push(item);
            }
            Some("tags") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read tags: {e}")))?;
                tags.extend(split_list(Some(&text)));
            }
            _ => {}
        }
    }

    if items.is_empty() {
        return Err(AppError::Validation("Missing 'file' field".into()));
    }

    let filenames: Vec<String> = items.iter().map(|i| i.filename.clone()).collect();
    let items = items
        .into_iter()
        .map(|item| item.with_tags(tags.clone()))
        .collect();

    let outcomes = state.vault.upload(auth_user.owner(), items).await?;

    let stored = outcomes.iter().filter(|o| o.is_ok()).count();
    if stored == 0 {
        // Nothing was stored: answer with the first item's error status.
        let first = outcomes.into_iter().find_map(Result::err);
        return Err(first.map_or_else(
            || AppError::Internal("Upload produced no outcome".into()),
            AppError::from,
        ));
    }

    let results: Vec<UploadResult> = filenames
        .into_iter()
        .zip(outcomes)
        .map(|(filename, outcome)| match outcome {
            Ok(uploaded) => UploadResult::stored(filename, uploaded),
            Err(e) => UploadResult::failed(filename, e.into()),
        })
        .collect();
    let failed = results.len() - stored;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            results,
            stored,
            failed,
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List the caller's files",
    description = "Newest first. Media types ending in `/` or `/*` match a whole family.",
    params(FileListQuery),
    responses(
        (status = 200, description = "One page of files", body = FileListResponse),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(owner_id = %auth_user.user_id))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FileListQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let filter = query.filter()?;
    let page = query.page.unwrap_or(1).max(1);

    let (files, total) = state
        .vault
        .list_files(auth_user.user_id, &filter, page)
        .await?;

    Ok(Json(FileListResponse {
        data: files.into_iter().map(FileResponse::from).collect(),
        pagination: Pagination::new(page, state.vault.config().page_size, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file_id = parse_id(&id, "file")?;
    let found = state
        .vault
        .get_file(file_id, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    Ok(Json(found.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the file and releases its content. Content no other file uses is \
        purged from storage.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let file_id = parse_id(&id, "file")?;
    state
        .vault
        .delete(file_id, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let file_id = parse_id(&id, "file")?;
    let download = state
        .vault
        .download_owned(file_id, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    download_response(download)
}

#[utoipa::path(
    get,
    path = "/{id}/share",
    tag = "Files",
    operation_id = "getFileShare",
    summary = "Get the share of a file",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "Current share", body = ShareResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found or not shared (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn get_file_share(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareResponse>, AppError> {
    let file_id = parse_id(&id, "file")?;
    get_share(&state, &auth_user, TargetType::File, file_id).await
}

#[utoipa::path(
    put,
    path = "/{id}/share",
    tag = "Files",
    operation_id = "shareFile",
    summary = "Share a file",
    description = "Creates or replaces the share of a file. A new token is issued every time, \
        so earlier links stop working.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    request_body = ShareBody,
    responses(
        (status = 200, description = "Share created", body = ShareResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(owner_id = %auth_user.user_id))]
pub async fn share_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<ShareBody>,
) -> Result<Json<ShareResponse>, AppError> {
    let file_id = parse_id(&id, "file")?;
    put_share(&state, &auth_user, TargetType::File, file_id, body).await
}

#[utoipa::path(
    delete,
    path = "/{id}/share",
    tag = "Files",
    operation_id = "revokeFileShare",
    summary = "Revoke the share of a file",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "Share revoked (or there was none)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn revoke_file_share(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let file_id = parse_id(&id, "file")?;
    revoke_share(&state, &auth_user, TargetType::File, file_id).await
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Files",
    operation_id = "storageStats",
    summary = "Storage usage of the caller",
    description = "`original_bytes` counts every live file; `dedup_bytes` counts each distinct \
        content once.",
    responses(
        (status = 200, description = "Usage summary", body = StorageStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn storage_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StorageStatsResponse>, AppError> {
    let stats = state.vault.storage_stats(auth_user.owner()).await?;
    Ok(Json(stats.into()))
}

pub(crate) async fn get_share(
    state: &AppState,
    auth_user: &AuthUser,
    target_type: TargetType,
    target_id: uuid::Uuid,
) -> Result<Json<ShareResponse>, AppError> {
    match state
        .vault
        .get_share(auth_user.user_id, target_type, target_id)
        .await?
    {
        Some(Some(share)) => Ok(Json(share.into())),
        Some(None) => Err(AppError::NotFound("Not shared".into())),
        None => Err(AppError::NotFound(not_found_message(target_type).into())),
    }
}

pub(crate) async fn put_share(
    state: &AppState,
    auth_user: &AuthUser,
    target_type: TargetType,
    target_id: uuid::Uuid,
    body: ShareBody,
) -> Result<Json<ShareResponse>, AppError> {
    let request = body.into_request(Utc::now())?;
    let share = state
        .vault
        .share(auth_user.user_id, target_type, target_id, request)
        .await?
        .ok_or_else(|| AppError::NotFound(not_found_message(target_type).into()))?;
    Ok(Json(share.into()))
}

pub(crate) async fn revoke_share(
    state: &AppState,
    auth_user: &AuthUser,
    target_type: TargetType,
    target_id: uuid::Uuid,
) -> Result<StatusCode, AppError> {
    if !state
        .vault
        .revoke_share(auth_user.user_id, target_type, target_id)
        .await?
    {
        return Err(AppError::NotFound(not_found_message(target_type).into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn not_found_message(target_type: TargetType) -> &'static str {
    match target_type {
        TargetType::File => "File not found",
        TargetType::Folder => "Folder not found",
    }
}
