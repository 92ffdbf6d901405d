pub mod content;
pub mod storage;

pub use content::{ContentIdentity, GENERIC_MEDIA_TYPE};
pub use storage::{BlobStore, ContentDigest, StorageError, StoredObject};
