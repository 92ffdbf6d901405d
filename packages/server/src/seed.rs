use sea_orm::*;
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use tracing::{info, warn};

use crate::entity::{file, folder};

/// Secondary indexes not expressible through schema sync.
fn secondary_indexes() -> Vec<(&'static str, IndexCreateStatement)> {
    vec![
        // Owner listings and usage sums:
        // WHERE owner_id = ? AND is_deleted = false ORDER BY uploaded_at DESC
        (
            "idx_file_owner_live_uploaded",
            Index::create()
                .if_not_exists()
                .name("idx_file_owner_live_uploaded")
                .table(file::Entity)
                .col(file::Column::OwnerId)
                .col(file::Column::IsDeleted)
                .col(file::Column::UploadedAt)
                .to_owned(),
        ),
        // Reverse lookup from blob to the files referencing it.
        (
            "idx_file_blob",
            Index::create()
                .if_not_exists()
                .name("idx_file_blob")
                .table(file::Entity)
                .col(file::Column::BlobId)
                .to_owned(),
        ),
        // Folder children listing.
        (
            "idx_folder_owner_parent",
            Index::create()
                .if_not_exists()
                .name("idx_folder_owner_parent")
                .table(folder::Entity)
                .col(folder::Column::OwnerId)
                .col(folder::Column::ParentId)
                .to_owned(),
        ),
    ]
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (name, index) in secondary_indexes() {
        let stmt = index.to_string(PostgresQueryBuilder);
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
