use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of object a share grants access to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    #[sea_orm(string_value = "FILE")]
    File,
    #[sea_orm(string_value = "FOLDER")]
    Folder,
}

/// Whether a shared target is listed publicly.
///
/// `Private` shares may still carry a token, which works as an unlisted link.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    #[sea_orm(string_value = "PRIVATE")]
    Private,
    #[sea_orm(string_value = "PUBLIC")]
    Public,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "share")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_type: TargetType,
    #[sea_orm(primary_key, auto_increment = false)]
    pub target_id: Uuid,

    pub visibility: Visibility,

    /// Bearer token for link access.
    #[sea_orm(unique)]
    pub token: Option<String>,

    pub expires_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// True if the share has an expiry and it lies at or before `now`.
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

impl ActiveModelBehavior for ActiveModel {}
