use log::warn;

use super::{SyncError, SyncService};
use crate::stats::{compute_stats, TaskStats};

impl SyncService {
    /// Aggregate counts, from the remote store when reachable, otherwise computed locally.
    pub async fn get_stats(&self) -> Result<TaskStats, SyncError> {
        if self.remote_reachable().await {
            match self.remote.stats().await {
                Ok(stats) => return Ok(stats),
                Err(e) => warn!("⚠️  Remote stats unavailable, computing locally: {e}"),
            }
        }
        let tasks = self.storage.list_all().await?;
        Ok(compute_stats(&tasks))
    }
}
