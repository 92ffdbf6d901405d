use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user;

/// Owner records. Identities are issued elsewhere; this only mirrors them.
pub struct UserCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(self.conn).await
    }

    /// Create the owner on first sight, or refresh its display name when
    /// one is given. An existing quota is never overwritten.
    pub async fn upsert(
        &self,
        email: &str,
        name: Option<&str>,
        default_quota: i64,
    ) -> Result<user::Model, DbErr> {
        let email = email.trim().to_lowercase();
        let model = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.clone()),
            name: Set(name.map(str::to_string)),
            quota_bytes: Set(default_quota),
            created_at: Set(Utc::now()),
        };

        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Email)
                    .value(
                        user::Column::Name,
                        Expr::cust(r#"COALESCE("excluded"."name", "user"."name")"#),
                    )
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.conn)
            .await?
            .ok_or_else(|| DbErr::Custom("user missing after upsert".into()))
    }
}
