use common::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

use crate::utils::filename::NameError;

/// Failures surfaced by vault operations.
///
/// Missing or foreign objects are not errors: operations return `None`.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("file is {size} bytes, the limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("upload of {incoming} bytes exceeds quota ({used} of {quota} bytes used)")]
    QuotaExceeded { used: i64, incoming: i64, quota: i64 },

    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// The reference-counting model was violated; indicates a bug.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("gave up resolving blob {0} after repeated concurrent changes")]
    Contention(String),

    #[error("catalog error: {0}")]
    Database(#[from] DbErr),

    #[error("blob store error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to read upload: {0}")]
    Read(#[from] std::io::Error),
}
