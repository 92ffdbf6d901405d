use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use super::file::{get_share, put_share, revoke_share};
use super::parse_id;
use crate::entity::share::TargetType;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::folder::{
    CreateFolderRequest, FolderListQuery, FolderResponse, RenameFolderRequest,
};
use crate::models::share::{ShareBody, ShareResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Folders",
    operation_id = "createFolder",
    summary = "Create a folder",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Parent folder not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(owner_id = %auth_user.user_id))]
pub async fn create_folder(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFolderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let parent_id = payload
        .parent_id
        .as_deref()
        .map(|id| parse_id(id, "parent folder"))
        .transpose()?;

    let folder = state
        .vault
        .create_folder(auth_user.user_id, parent_id, &payload.name)
        .await?
        .ok_or_else(|| AppError::NotFound("Parent folder not found".into()))?;

    Ok((StatusCode::CREATED, Json(FolderResponse::from(folder))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Folders",
    operation_id = "listFolders",
    summary = "List folders under a parent",
    description = "Lists top-level folders, or the children of `parent_id`, by name.",
    params(FolderListQuery),
    responses(
        (status = 200, description = "Folders", body = Vec<FolderResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(owner_id = %auth_user.user_id))]
pub async fn list_folders(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FolderListQuery>,
) -> Result<Json<Vec<FolderResponse>>, AppError> {
    let parent_id = query
        .parent_id
        .as_deref()
        .map(|id| parse_id(id, "parent folder"))
        .transpose()?;

    let folders = state
        .vault
        .list_folders(auth_user.user_id, parent_id)
        .await?;
    Ok(Json(folders.into_iter().map(FolderResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}/tree",
    tag = "Folders",
    operation_id = "folderTree",
    summary = "A folder and all of its descendants",
    params(("id" = String, Path, description = "Folder ID (UUID)")),
    responses(
        (status = 200, description = "Folder subtree", body = Vec<FolderResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Folder not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn folder_tree(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FolderResponse>>, AppError> {
    let folder_id = parse_id(&id, "folder")?;
    let tree = state
        .vault
        .folder_tree(auth_user.user_id, folder_id)
        .await?;
    if tree.is_empty() {
        return Err(AppError::NotFound("Folder not found".into()));
    }
    Ok(Json(tree.into_iter().map(FolderResponse::from).collect()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Folders",
    operation_id = "renameFolder",
    summary = "Rename a folder",
    params(("id" = String, Path, description = "Folder ID (UUID)")),
    request_body = RenameFolderRequest,
    responses(
        (status = 200, description = "Folder renamed", body = FolderResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Folder not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(owner_id = %auth_user.user_id))]
pub async fn rename_folder(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<RenameFolderRequest>,
) -> Result<Json<FolderResponse>, AppError> {
    let folder_id = parse_id(&id, "folder")?;
    let folder = state
        .vault
        .rename_folder(folder_id, auth_user.user_id, &payload.name)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".into()))?;
    Ok(Json(folder.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Folders",
    operation_id = "deleteFolder",
    summary = "Delete a folder and its subfolders",
    description = "Shares of the removed folders are revoked with them.",
    params(("id" = String, Path, description = "Folder ID (UUID)")),
    responses(
        (status = 204, description = "Folder deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Folder not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn delete_folder(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let folder_id = parse_id(&id, "folder")?;
    if !state
        .vault
        .delete_folder(folder_id, auth_user.user_id)
        .await?
    {
        return Err(AppError::NotFound("Folder not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/share",
    tag = "Folders",
    operation_id = "getFolderShare",
    summary = "Get the share of a folder",
    params(("id" = String, Path, description = "Folder ID (UUID)")),
    responses(
        (status = 200, description = "Current share", body = ShareResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Folder not found or not shared (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn get_folder_share(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareResponse>, AppError> {
    let folder_id = parse_id(&id, "folder")?;
    get_share(&state, &auth_user, TargetType::Folder, folder_id).await
}

#[utoipa::path(
    put,
    path = "/{id}/share",
    tag = "Folders",
    operation_id = "shareFolder",
    summary = "Share a folder",
    params(("id" = String, Path, description = "Folder ID (UUID)")),
    request_body = ShareBody,
    responses(
        (status = 200, description = "Share created", body = ShareResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Folder not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(owner_id = %auth_user.user_id))]
pub async fn share_folder(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<ShareBody>,
) -> Result<Json<ShareResponse>, AppError> {
    let folder_id = parse_id(&id, "folder")?;
    put_share(&state, &auth_user, TargetType::Folder, folder_id, body).await
}

#[utoipa::path(
    delete,
    path = "/{id}/share",
    tag = "Folders",
    operation_id = "revokeFolderShare",
    summary = "Revoke the share of a folder",
    params(("id" = String, Path, description = "Folder ID (UUID)")),
    responses(
        (status = 204, description = "Share revoked (or there was none)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Folder not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.user_id))]
pub async fn revoke_folder_share(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let folder_id = parse_id(&id, "folder")?;
    revoke_share(&state, &auth_user, TargetType::Folder, folder_id).await
}
