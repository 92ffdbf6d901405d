use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, Order};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::folder;

pub struct FolderCatalog<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FolderCatalog<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> Result<folder::Model, DbErr> {
        let now = Utc::now();
        let model = folder::ActiveModel {
            id: Set(Uuid::now_v7()),
            owner_id: Set(owner_id),
            parent_id: Set(parent_id),
            name: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(self.conn).await
    }

    /// A folder owned by `owner_id`.
    pub async fn get_owned(
        &self,
        folder_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<folder::Model>, DbErr> {
        folder::Entity::find_by_id(folder_id)
            .filter(folder::Column::OwnerId.eq(owner_id))
            .one(self.conn)
            .await
    }

    pub async fn rename(
        &self,
        folder_id: Uuid,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<folder::Model>, DbErr> {
        let result = folder::Entity::update_many()
            .col_expr(folder::Column::Name, Expr::value(name))
            .col_expr(folder::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(folder::Column::Id.eq(folder_id))
            .filter(folder::Column::OwnerId.eq(owner_id))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_owned(folder_id, owner_id).await
    }

    /// Direct children of `parent_id`, or top-level folders when `None`,
    /// sorted case-insensitively by name.
    pub async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<folder::Model>, DbErr> {
        let parent = match parent_id {
            Some(id) => folder::Column::ParentId.eq(id),
            None => folder::Column::ParentId.is_null(),
        };
        folder::Entity::find()
            .filter(folder::Column::OwnerId.eq(owner_id))
            .filter(parent)
            .order_by(
                Expr::expr(Func::lower(Expr::col(folder::Column::Name))),
                Order::Asc,
            )
            .all(self.conn)
            .await
    }

    /// A folder and all of its descendants. Empty if the root is not owned.
    pub async fn tree(&self, owner_id: Uuid, root_id: Uuid) -> Result<Vec<folder::Model>, DbErr> {
        folder::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"WITH RECURSIVE "tree" AS (
                       SELECT * FROM "folder" WHERE "id" = $1 AND "owner_id" = $2
                       UNION ALL
                       SELECT f.* FROM "folder" f JOIN "tree" t ON f."parent_id" = t."id"
                   )
                   SELECT * FROM "tree""#,
                [root_id.into(), owner_id.into()],
            ))
            .all(self.conn)
            .await
    }

    /// Delete a folder subtree. Returns the ids that were removed.
    pub async fn delete_tree(&self, folder_id: Uuid, owner_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        let ids: Vec<Uuid> = self
            .tree(owner_id, folder_id)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        if ids.is_empty() {
            return Ok(ids);
        }

        folder::Entity::delete_many()
            .filter(folder::Column::Id.is_in(ids.clone()))
            .filter(folder::Column::OwnerId.eq(owner_id))
            .exec(self.conn)
            .await?;
        Ok(ids)
    }
}
