use log::debug;
use sea_orm::ActiveValue::Set;

use super::db::LocalStorage;
use super::error::StorageResult;
use crate::entities::tombstone;
use crate::repositories::TombstoneRepository;
use crate::utils::datetime::now_timestamp;

/// A deletion the remote store has not confirmed yet
pub type Tombstone = tombstone::Model;

impl LocalStorage {
    /// Remember that `id` was deleted locally and must be deleted remotely as `remote_id`.
    pub async fn add_tombstone(&self, id: &str, remote_id: &str) -> StorageResult<()> {
        self.ensure_initialized()?;
        let model = tombstone::ActiveModel {
            id: Set(id.to_string()),
            remote_id: Set(remote_id.to_string()),
            deleted_at: Set(now_timestamp()),
        };
        TombstoneRepository::upsert(&self.conn, model).await?;
        debug!("🪦 Recorded pending remote delete for {remote_id}");
        Ok(())
    }

    /// Pending remote deletions, oldest first.
    pub async fn list_tombstones(&self) -> StorageResult<Vec<Tombstone>> {
        self.ensure_initialized()?;
        Ok(TombstoneRepository::get_all(&self.conn).await?)
    }

    /// Forget a pending deletion. Returns whether one existed.
    pub async fn clear_tombstone(&self, id: &str) -> StorageResult<bool> {
        self.ensure_initialized()?;
        Ok(TombstoneRepository::delete(&self.conn, id).await? > 0)
    }
}
