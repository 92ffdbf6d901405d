use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{BlobStore, ContentIdentity, GENERIC_MEDIA_TYPE};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::error::VaultError;
use super::token::generate_share_token;
use crate::catalog::{
    BlobCatalog, FileCatalog, FileFilter, FileWithBlob, FolderCatalog, NewBlob, NewFile,
    PublicFile, ShareCatalog, ShareGrant,
};
use crate::config::VaultConfig;
use crate::entity::share::{TargetType, Visibility};
use crate::entity::{blob, file, folder, share, user};
use crate::utils::filename::validate_name;

/// Attempts at resolving a blob before giving up on concurrent churn.
const MAX_RESOLVE_ATTEMPTS: usize = 3;

/// The identity and quota of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub id: Uuid,
    /// Zero or negative means unlimited.
    pub quota_bytes: i64,
}

impl From<&user::Model> for Owner {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            quota_bytes: user.quota_bytes,
        }
    }
}

/// One file of an upload batch.
pub struct UploadItem {
    pub filename: String,
    pub declared_type: Option<String>,
    pub tags: Vec<String>,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl UploadItem {
    /// An item backed by an in-memory payload.
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            declared_type: None,
            tags: Vec::new(),
            reader: Box::new(std::io::Cursor::new(data.into())),
        }
    }

    pub fn with_declared_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Outcome of one successfully stored upload item.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file: file::Model,
    /// The blob with its reference count after this upload.
    pub blob: blob::Model,
    /// True if this upload wrote the bytes for the first time.
    pub is_new: bool,
}

/// Bytes of a file ready to be sent to the client.
#[derive(Debug, Clone)]
pub struct Download {
    pub file: file::Model,
    pub blob: blob::Model,
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Raw versus deduplicated usage of one owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageStats {
    pub original_bytes: i64,
    pub dedup_bytes: i64,
    pub savings_bytes: i64,
    /// Share of the original usage saved by deduplication, 0 to 100.
    pub savings_percent: f64,
    pub quota_bytes: i64,
}

impl StorageStats {
    pub fn new(original_bytes: i64, dedup_bytes: i64, quota_bytes: i64) -> Self {
        let savings_bytes = original_bytes - dedup_bytes;
        let savings_percent = if original_bytes > 0 {
            savings_bytes as f64 / original_bytes as f64 * 100.0
        } else {
            0.0
        };
        Self {
            original_bytes,
            dedup_bytes,
            savings_bytes,
            savings_percent,
            quota_bytes,
        }
    }
}

/// Requested share settings. `expires_at: None` applies the default lifetime.
#[derive(Debug, Clone, Copy)]
pub struct ShareRequest {
    pub visibility: Visibility,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Pick the content type for a download, most specific source first.
pub fn resolve_content_type(
    stored: Option<&str>,
    declared: Option<&str>,
    detected: &str,
) -> String {
    [stored, declared, Some(detected)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or(GENERIC_MEDIA_TYPE)
        .to_string()
}

/// Orchestrates the catalogs and the blob store.
#[derive(Clone)]
pub struct Vault {
    db: DatabaseConnection,
    store: Arc<dyn BlobStore>,
    config: VaultConfig,
}

impl Vault {
    pub fn new(db: DatabaseConnection, store: Arc<dyn BlobStore>, config: VaultConfig) -> Self {
        Self { db, store, config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Store a batch of files for `owner`.
    ///
    /// Usage is read once for the whole batch and advanced in memory as
    /// items succeed. Each item succeeds or fails on its own; only failing
    /// to read the starting usage fails the batch.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn upload(
        &self,
        owner: Owner,
        items: Vec<UploadItem>,
    ) -> Result<Vec<Result<UploadedFile, VaultError>>, VaultError> {
        let usage = FileCatalog::new(&self.db).usage(owner.id).await?;
        let mut running_usage = usage.original;

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let filename = item.filename.clone();
            let result = self.upload_one(owner, item, running_usage).await;
            match &result {
                Ok(uploaded) => {
                    running_usage += uploaded.file.size_original;
                    info!(
                        file_id = %uploaded.file.id,
                        blob_id = %uploaded.blob.id,
                        is_new = uploaded.is_new,
                        "Stored upload"
                    );
                }
                Err(e) => warn!(filename = %filename, error = %e, "Rejected upload"),
            }
            results.push(result);
        }

        Ok(results)
    }

    async fn upload_one(
        &self,
        owner: Owner,
        mut item: UploadItem,
        running_usage: i64,
    ) -> Result<UploadedFile, VaultError> {
        let filename = validate_name(&item.filename)?.to_string();

        let mut data = Vec::new();
        match self.config.upload_limit() {
            Some(limit) => {
                item.reader
                    .take(limit.saturating_add(1))
                    .read_to_end(&mut data)
                    .await?;
                let size = data.len() as u64;
                if size > limit {
                    return Err(VaultError::TooLarge { size, limit });
                }
            }
            None => {
                item.reader.read_to_end(&mut data).await?;
            }
        }
        let size = data.len() as u64;

        let declared_type = item
            .declared_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let identity = ContentIdentity::analyze(&data, declared_type.as_deref());
        let size = size as i64;

        if owner.quota_bytes > 0 && running_usage + size > owner.quota_bytes {
            return Err(VaultError::QuotaExceeded {
                used: running_usage,
                incoming: size,
                quota: owner.quota_bytes,
            });
        }

        let txn = self.db.begin().await?;
        let (blob, is_new) = self.resolve_blob(&txn, &identity, &data).await?;
        let file = FileCatalog::new(&txn)
            .insert(NewFile {
                owner_id: owner.id,
                blob_id: blob.id,
                filename,
                declared_type,
                size,
                tags: item.tags,
            })
            .await?;
        txn.commit().await?;

        Ok(UploadedFile { file, blob, is_new })
    }

    /// Take a reference to the blob for `identity`, storing it if novel.
    async fn resolve_blob<C: ConnectionTrait>(
        &self,
        conn: &C,
        identity: &ContentIdentity,
        data: &[u8],
    ) -> Result<(blob::Model, bool), VaultError> {
        let blobs = BlobCatalog::new(conn);
        let digest = identity.digest.to_hex();

        for attempt in 1..=MAX_RESOLVE_ATTEMPTS {
            match blobs.find_by_digest(&digest).await? {
                Some(existing) => {
                    if let Some(updated) = blobs.increment_ref(existing.id).await? {
                        return Ok((updated, false));
                    }
                    debug!(%digest, attempt, "Blob purged while resolving, retrying");
                }
                None => {
                    let storage_key = identity.storage_key();
                    self.store
                        .put(&storage_key, data, &identity.media_type)
                        .await?;
                    let inserted = blobs
                        .insert(NewBlob {
                            digest: digest.clone(),
                            size: identity.size as i64,
                            media_type: identity.media_type.clone(),
                            storage_key,
                        })
                        .await?;
                    if let Some(created) = inserted {
                        return Ok((created, true));
                    }
                    debug!(%digest, attempt, "Lost blob insert race, retrying");
                }
            }
        }

        Err(VaultError::Contention(digest))
    }

    /// Soft-delete a file and release its blob reference.
    ///
    /// The file flag, the decrement and the removal of an unreferenced blob
    /// row commit together. The stored bytes of such a blob are removed
    /// before that commit; a failure there only leaks bytes and is logged.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<file::Model>, VaultError> {
        let txn = self.db.begin().await?;

        let Some(file) = FileCatalog::new(&txn).mark_deleted(file_id, owner_id).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        let Some(blob_id) = file.blob_id else {
            error!(%file_id, "Live file has no blob");
            return Err(VaultError::InvariantViolation(format!(
                "live file {file_id} has no blob"
            )));
        };

        let blobs = BlobCatalog::new(&txn);
        let blob = blobs.decrement_ref(blob_id).await?.ok_or_else(|| {
            VaultError::InvariantViolation(format!(
                "blob {blob_id} had no reference left for file {file_id}"
            ))
        })?;

        let purged = blob.ref_count <= 0;
        if purged {
            blobs.delete(blob.id).await?;
            match self.store.delete(&blob.storage_key).await {
                Ok(existed) => info!(blob_id = %blob.id, existed, "Purged unreferenced blob"),
                Err(e) => warn!(
                    blob_id = %blob.id,
                    storage_key = %blob.storage_key,
                    error = %e,
                    "Failed to delete blob bytes, leaking them"
                ),
            }
        }

        if let Err(e) = txn.commit().await {
            if purged {
                error!(
                    %file_id,
                    blob_id = %blob.id,
                    storage_key = %blob.storage_key,
                    error = %e,
                    "Delete rolled back after blob bytes were removed; file references missing bytes"
                );
            }
            return Err(e.into());
        }

        if let Err(e) = ShareCatalog::new(&self.db)
            .delete(TargetType::File, file_id)
            .await
        {
            warn!(%file_id, error = %e, "Failed to remove share of deleted file");
        }

        Ok(Some(file))
    }

    /// Download a file through ownership.
    #[instrument(skip(self))]
    pub async fn download_owned(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Download>, VaultError> {
        match FileCatalog::new(&self.db)
            .find_owned(file_id, owner_id)
            .await?
        {
            Some(found) => self.fetch(found).await.map(Some),
            None => Ok(None),
        }
    }

    /// Download a file through a share token, bypassing ownership.
    #[instrument(skip_all)]
    pub async fn download_shared(&self, token: &str) -> Result<Option<Download>, VaultError> {
        match FileCatalog::new(&self.db)
            .find_by_share_token(token, Utc::now())
            .await?
        {
            Some(found) => self.fetch(found).await.map(Some),
            None => Ok(None),
        }
    }

    /// Download a publicly listed file by id. Resolves through its share
    /// token, so an expired share hides the file.
    #[instrument(skip(self))]
    pub async fn download_public(&self, file_id: Uuid) -> Result<Option<Download>, VaultError> {
        let share = ShareCatalog::new(&self.db)
            .get_by_target(TargetType::File, file_id)
            .await?;
        match share {
            Some(share::Model {
                visibility: Visibility::Public,
                token: Some(token),
                ..
            }) if !token.is_empty() => self.download_shared(&token).await,
            _ => Ok(None),
        }
    }

    async fn fetch(&self, found: FileWithBlob) -> Result<Download, VaultError> {
        let FileWithBlob { file, blob } = found;
        let object = self.store.get(&blob.storage_key).await?;

        if let Err(e) = FileCatalog::new(&self.db)
            .increment_download_count(file.id)
            .await
        {
            warn!(file_id = %file.id, error = %e, "Failed to record download");
        }

        let content_type = resolve_content_type(
            object.content_type.as_deref(),
            file.declared_type.as_deref(),
            &blob.media_type,
        );

        Ok(Download {
            file,
            blob,
            data: object.data,
            content_type,
        })
    }

    pub async fn get_file(
        &self,
        file_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<FileWithBlob>, VaultError> {
        Ok(FileCatalog::new(&self.db)
            .find_owned(file_id, owner_id)
            .await?)
    }

    /// One page of the owner's live files and the total match count.
    pub async fn list_files(
        &self,
        owner_id: Uuid,
        filter: &FileFilter,
        page: u64,
    ) -> Result<(Vec<FileWithBlob>, u64), VaultError> {
        Ok(FileCatalog::new(&self.db)
            .list_by_owner(owner_id, filter, page.max(1), self.config.page_size)
            .await?)
    }

    /// One page of publicly shared files and the total match count.
    pub async fn list_public(
        &self,
        filter: &FileFilter,
        page: u64,
    ) -> Result<(Vec<PublicFile>, u64), VaultError> {
        Ok(FileCatalog::new(&self.db)
            .list_public(filter, Utc::now(), page.max(1), self.config.page_size)
            .await?)
    }

    fn expiry_for(&self, requested: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        requested.or_else(|| {
            (self.config.share_ttl_secs > 0)
                .then(|| Utc::now() + Duration::seconds(self.config.share_ttl_secs as i64))
        })
    }

    async fn owns_target(
        &self,
        owner_id: Uuid,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<bool, VaultError> {
        let owned = match target_type {
            TargetType::File => FileCatalog::new(&self.db)
                .find_owned(target_id, owner_id)
                .await?
                .is_some(),
            TargetType::Folder => FolderCatalog::new(&self.db)
                .get_owned(target_id, owner_id)
                .await?
                .is_some(),
        };
        Ok(owned)
    }

    /// Share a file or folder, replacing any previous share and rotating
    /// its token. `None` if the caller does not own the target.
    #[instrument(skip(self, request))]
    pub async fn share(
        &self,
        owner_id: Uuid,
        target_type: TargetType,
        target_id: Uuid,
        request: ShareRequest,
    ) -> Result<Option<share::Model>, VaultError> {
        if !self.owns_target(owner_id, target_type, target_id).await? {
            return Ok(None);
        }

        let share = ShareCatalog::new(&self.db)
            .upsert(ShareGrant {
                target_type,
                target_id,
                visibility: request.visibility,
                token: Some(generate_share_token()),
                expires_at: self.expiry_for(request.expires_at),
            })
            .await?;
        Ok(Some(share))
    }

    /// The current share of an owned target. The outer `None` means the
    /// target is not owned; the inner one that it is not shared.
    pub async fn get_share(
        &self,
        owner_id: Uuid,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<Option<Option<share::Model>>, VaultError> {
        if !self.owns_target(owner_id, target_type, target_id).await? {
            return Ok(None);
        }
        let share = ShareCatalog::new(&self.db)
            .get_by_target(target_type, target_id)
            .await?;
        Ok(Some(share))
    }

    /// Revoke the share of an owned target. Revoking an unshared target is
    /// not an error. `false` if the caller does not own the target.
    #[instrument(skip(self))]
    pub async fn revoke_share(
        &self,
        owner_id: Uuid,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<bool, VaultError> {
        if !self.owns_target(owner_id, target_type, target_id).await? {
            return Ok(false);
        }
        ShareCatalog::new(&self.db)
            .delete(target_type, target_id)
            .await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn storage_stats(&self, owner: Owner) -> Result<StorageStats, VaultError> {
        let usage = FileCatalog::new(&self.db).usage(owner.id).await?;
        Ok(StorageStats::new(
            usage.original,
            usage.dedup,
            owner.quota_bytes,
        ))
    }

    /// Create a folder. `None` if `parent_id` names a folder the caller
    /// does not own.
    pub async fn create_folder(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> Result<Option<folder::Model>, VaultError> {
        let name = validate_name(name)?;
        let folders = FolderCatalog::new(&self.db);
        if let Some(parent_id) = parent_id
            && folders.get_owned(parent_id, owner_id).await?.is_none()
        {
            return Ok(None);
        }
        Ok(Some(folders.create(owner_id, parent_id, name).await?))
    }

    pub async fn rename_folder(
        &self,
        folder_id: Uuid,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<folder::Model>, VaultError> {
        let name = validate_name(name)?;
        Ok(FolderCatalog::new(&self.db)
            .rename(folder_id, owner_id, name)
            .await?)
    }

    pub async fn list_folders(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<folder::Model>, VaultError> {
        Ok(FolderCatalog::new(&self.db)
            .list_children(owner_id, parent_id)
            .await?)
    }

    pub async fn folder_tree(
        &self,
        owner_id: Uuid,
        root_id: Uuid,
    ) -> Result<Vec<folder::Model>, VaultError> {
        Ok(FolderCatalog::new(&self.db).tree(owner_id, root_id).await?)
    }

    /// Delete a folder with its subfolders and their shares. `false` if the
    /// folder does not exist or is not owned.
    #[instrument(skip(self))]
    pub async fn delete_folder(&self, folder_id: Uuid, owner_id: Uuid) -> Result<bool, VaultError> {
        let txn = self.db.begin().await?;
        let removed = FolderCatalog::new(&txn)
            .delete_tree(folder_id, owner_id)
            .await?;
        if removed.is_empty() {
            txn.rollback().await?;
            return Ok(false);
        }

        let shares = ShareCatalog::new(&txn);
        for id in &removed {
            shares.delete(TargetType::Folder, *id).await?;
        }
        txn.commit().await?;

        info!(%folder_id, removed = removed.len(), "Deleted folder tree");
        Ok(true)
    }
}
