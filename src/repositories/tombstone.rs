//! Tombstone repository for database operations.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, QueryOrder};

use crate::entities::tombstone;

/// Repository for pending remote deletions.
pub struct TombstoneRepository;

impl TombstoneRepository {
    /// Get all tombstones, oldest first.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<tombstone::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        tombstone::Entity::find()
            .order_by_asc(tombstone::Column::DeletedAt)
            .all(conn)
            .await
    }

    /// Insert or refresh a tombstone.
    pub async fn upsert<C>(conn: &C, tombstone: tombstone::ActiveModel) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::OnConflict;
        tombstone::Entity::insert(tombstone)
            .on_conflict(
                OnConflict::column(tombstone::Column::Id)
                    .update_columns([tombstone::Column::RemoteId, tombstone::Column::DeletedAt])
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Remove a tombstone by id.
    pub async fn delete<C>(conn: &C, id: &str) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(tombstone::Entity::delete_by_id(id.to_string())
            .exec(conn)
            .await?
            .rows_affected)
    }
}
