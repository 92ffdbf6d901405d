//! Relational catalogs for blobs, files, shares, folders and owners.
//!
//! Each catalog is a thin service over a borrowed connection so the same code
//! runs against a pool or inside a transaction.

pub mod blob;
pub mod file;
pub mod filter;
pub mod folder;
pub mod share;
pub mod user;

pub use blob::{BlobCatalog, NewBlob};
pub use file::{FileCatalog, FileWithBlob, NewFile, OwnerUsage, PublicFile};
pub use filter::FileFilter;
pub use folder::FolderCatalog;
pub use share::{ShareCatalog, ShareGrant};
pub use user::UserCatalog;
