use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::folder;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateFolderRequest {
    #[schema(example = "Invoices")]
    pub name: String,
    /// Parent folder; omitted for a top-level folder.
    pub parent_id: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenameFolderRequest {
    #[schema(example = "Invoices 2025")]
    pub name: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct FolderListQuery {
    /// List the children of this folder instead of the top level.
    pub parent_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FolderResponse {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<folder::Model> for FolderResponse {
    fn from(m: folder::Model) -> Self {
        Self {
            id: m.id.to_string(),
            name: m.name,
            parent_id: m.parent_id.map(|p| p.to_string()),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
