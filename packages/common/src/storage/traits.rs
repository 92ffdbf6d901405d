use async_trait::async_trait;

use super::error::StorageError;

/// Bytes fetched from a blob store, with the content type the store reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    /// `None` when the backend does not keep content types.
    pub content_type: Option<String>,
}

/// Object storage for immutable blob bytes, addressed by storage key.
///
/// Keys are derived from content digests, so writing the same key twice
/// always writes the same bytes and `put` may overwrite freely.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Delete the object under `key`.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Check whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}
