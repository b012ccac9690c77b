use log::{info, warn};

use super::merge::merge_views;
use super::push::PushError;
use super::{SyncError, SyncService};
use crate::models::{NewTask, Task, TaskPatch};
use crate::notify::Notification;
use crate::storage::StorageError;
use crate::utils::datetime::now_timestamp;

impl SyncService {
    /// Creates a task locally and pushes it when the remote is reachable.
    ///
    /// # Returns
    /// The remote-reconciled record if the push succeeded, otherwise the local record
    ///
    /// # Errors
    /// Returns `Validation` for a blank title or a bad image, `Storage` if the local
    /// write fails. Remote failures are absorbed.
    pub async fn add_task(&self, new_task: NewTask) -> Result<Task, SyncError> {
        let new_task = new_task.validated()?;
        let task = self.storage.insert(new_task, false).await?;
        info!("➕ Added task {} ({})", task.id, task.title);
        self.notifier.notify(Notification::TaskAdded {
            title: task.title.clone(),
        });

        self.push_after_write(task).await
    }

    /// Updates a task locally and pushes its current state when the remote is reachable.
    ///
    /// # Errors
    /// Returns `Validation` for invalid input, `Storage(NotFound)` if the task does not
    /// exist locally, or another `Storage` error if the local write fails
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<Task, SyncError> {
        let patch = patch.validated()?;
        let task = self.storage.update(id, patch).await?;
        info!("✏️  Updated task {}", task.id);

        self.push_after_write(task).await
    }

    /// Flip the completed state of a task.
    pub async fn toggle_complete(&self, id: &str) -> Result<Task, SyncError> {
        let current = self
            .storage
            .get(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let task = self.update_task(id, TaskPatch::completed(!current.completed)).await?;
        if task.completed {
            self.notifier.notify(Notification::TaskCompleted {
                title: task.title.clone(),
            });
        }
        Ok(task)
    }

    /// Deletes a task.
    ///
    /// The remote delete is attempted when reachable; if it cannot be confirmed a
    /// tombstone keeps the task hidden and the next pass retries. The local removal
    /// always happens, and deleting a task that is already gone locally succeeds.
    pub async fn delete_task(&self, id: &str) -> Result<(), SyncError> {
        // Tasks only ever seen in the merged view are addressed by their remote id
        let remote_id = match self.storage.get(id).await? {
            Some(task) => task.remote_id,
            None => Some(id.to_string()),
        };

        if let Some(remote_id) = remote_id {
            if !self.delete_remote(&remote_id).await {
                self.storage.add_tombstone(id, &remote_id).await?;
            }
        }

        match self.storage.remove(id).await {
            Ok(()) => info!("🗑️  Deleted task {id}"),
            Err(e) if e.is_not_found() => info!("🗑️  Task {id} was already gone locally"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// The task list to show.
    ///
    /// When the remote is reachable and returns records, this is the remote list merged
    /// with local changes that have not been pushed yet. Otherwise it is the local list.
    pub async fn get_tasks(&self) -> Result<Vec<Task>, SyncError> {
        let local = self.storage.list_all().await?;
        if !self.remote_reachable().await {
            return Ok(local);
        }

        let remote = match self.remote.list_tasks().await {
            Ok(remote) if !remote.is_empty() => remote,
            Ok(_) => return Ok(local),
            Err(e) => {
                warn!("⚠️  Could not list remote tasks, showing local copy: {e}");
                return Ok(local);
            }
        };

        let tombstones = self.storage.list_tombstones().await?;
        Ok(merge_views(remote, local, &tombstones, &now_timestamp()))
    }

    async fn push_after_write(&self, task: Task) -> Result<Task, SyncError> {
        if !self.remote_reachable().await {
            return Ok(task);
        }

        match self.push_record(&task).await {
            Ok(Some(pushed)) => Ok(pushed),
            Ok(None) => Ok(task),
            Err(PushError::Remote(e)) => {
                warn!("⚠️  Remote write failed, task {} kept locally: {e}", task.id);
                Ok(task)
            }
            Err(PushError::Storage(e)) => Err(e.into()),
        }
    }

    /// Best-effort remote delete. Returns whether the remote no longer has the task.
    async fn delete_remote(&self, remote_id: &str) -> bool {
        if !self.remote_reachable().await {
            return false;
        }
        match self.remote.delete_task(remote_id).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                warn!("⚠️  Remote delete of {remote_id} failed, will retry: {e}");
                false
            }
        }
    }
}
