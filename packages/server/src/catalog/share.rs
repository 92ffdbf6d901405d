use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::share::{self, TargetType, Visibility};

/// Desired state of a share; replaces any previous share of the same target.
#[derive(Debug, Clone)]
pub struct ShareGrant {
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub visibility: Visibility,
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct ShareCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ShareCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert or wholesale-replace the share for a target.
    pub async fn upsert(&self, grant: ShareGrant) -> Result<share::Model, DbErr> {
        let model = share::ActiveModel {
            target_type: Set(grant.target_type),
            target_id: Set(grant.target_id),
            visibility: Set(grant.visibility),
            token: Set(grant.token),
            expires_at: Set(grant.expires_at),
            created_at: Set(Utc::now()),
        };

        share::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([share::Column::TargetType, share::Column::TargetId])
                    .update_columns([
                        share::Column::Visibility,
                        share::Column::Token,
                        share::Column::ExpiresAt,
                        share::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        self.get_by_target(grant.target_type, grant.target_id)
            .await?
            .ok_or_else(|| DbErr::Custom("share missing after upsert".into()))
    }

    pub async fn get_by_target(
        &self,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<Option<share::Model>, DbErr> {
        share::Entity::find_by_id((target_type, target_id))
            .one(self.conn)
            .await
    }

    /// Remove the share of a target. Removing a missing share is not an error.
    pub async fn delete(&self, target_type: TargetType, target_id: Uuid) -> Result<bool, DbErr> {
        let result = share::Entity::delete_many()
            .filter(share::Column::TargetType.eq(target_type))
            .filter(share::Column::TargetId.eq(target_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
