//! Task repository for database operations.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::task;

/// Repository for task-related database operations.
pub struct TaskRepository;

impl TaskRepository {
    /// Get all task rows ordered by creation time.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<task::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        task::Entity::find()
            .order_by_asc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id)
            .all(conn)
            .await
    }

    /// Get a single task row by id.
    pub async fn get_by_id<C>(conn: &C, id: &str) -> Result<Option<task::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        task::Entity::find_by_id(id.to_string()).one(conn).await
    }

    /// Get rows not yet confirmed by the remote store.
    pub async fn get_unsynced<C>(conn: &C) -> Result<Vec<task::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        task::Entity::find()
            .filter(task::Column::Synced.eq(false))
            .order_by_asc(task::Column::CreatedAt)
            .all(conn)
            .await
    }

    /// Count rows not yet confirmed by the remote store.
    pub async fn count_unsynced<C>(conn: &C) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        use sea_orm::PaginatorTrait;
        task::Entity::find()
            .filter(task::Column::Synced.eq(false))
            .count(conn)
            .await
    }

    /// Insert a new task row.
    pub async fn insert<C>(conn: &C, task: task::ActiveModel) -> Result<task::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        task.insert(conn).await
    }

    /// Update an existing task row.
    pub async fn update<C>(conn: &C, task: task::ActiveModel) -> Result<task::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        task.update(conn).await
    }

    /// Delete a task row, returning how many rows were removed.
    pub async fn delete_by_id<C>(conn: &C, id: &str) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(task::Entity::delete_by_id(id.to_string()).exec(conn).await?.rows_affected)
    }

    /// Mark a row synced only if its `updated_at` still equals `expected_updated_at`.
    pub async fn mark_synced_if_unchanged<C>(conn: &C, id: &str, expected_updated_at: &str) -> Result<bool, DbErr>
    where
        C: ConnectionTrait,
    {
        let result = task::Entity::update_many()
            .col_expr(task::Column::Synced, Expr::value(true))
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::UpdatedAt.eq(expected_updated_at))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
