//! The vault: deduplicated uploads, reference-counted deletes, downloads,
//! sharing and usage accounting on top of the catalogs and a blob store.

pub mod error;
pub mod service;
pub mod token;

pub use error::VaultError;
pub use service::{
    Download, Owner, ShareRequest, StorageStats, UploadItem, UploadedFile, Vault,
    resolve_content_type,
};
