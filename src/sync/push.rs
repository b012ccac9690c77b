use log::{debug, warn};

use super::SyncService;
use crate::models::Task;
use crate::remote::{RemoteError, RemoteTaskArgs};
use crate::storage::StorageError;

/// Why a single record could not be pushed
#[derive(Debug)]
pub(crate) enum PushError {
    /// The remote leg failed; the record stays unsynced
    Remote(RemoteError),
    /// Reconciling the local record failed
    Storage(StorageError),
}

impl SyncService {
    /// Push the full current state of `task` to the remote store.
    ///
    /// Creates the record remotely when it has no remote identity, updates it otherwise.
    /// Returns the reconciled local record (unsynced if it was edited while the request
    /// was in flight), or `None` if it was deleted locally in the meantime.
    pub(crate) async fn push_record(&self, task: &Task) -> Result<Option<Task>, PushError> {
        if task.has_remote_identity() {
            return self.push_update(task).await.map(Some);
        }

        let created = self
            .remote
            .create_task(RemoteTaskArgs::from_task(task))
            .await
            .map_err(PushError::Remote)?;
        let adopted = match self
            .storage
            .adopt_remote(&task.id, &created, Some(&task.updated_at))
            .await
        {
            Ok(adopted) => adopted,
            Err(e) if e.is_not_found() => {
                warn!("⚠️  Task {} was deleted while being created remotely", task.id);
                self.storage
                    .add_tombstone(&created.id, &created.id)
                    .await
                    .map_err(PushError::Storage)?;
                return Ok(None);
            }
            Err(e) => return Err(PushError::Storage(e)),
        };
        if adopted.synced {
            return Ok(Some(adopted));
        }

        // The server kept different values than we sent, or the task changed meanwhile
        debug!("Task {} differs from the created remote record; updating it", adopted.id);
        match self.push_update(&adopted).await {
            Ok(updated) => Ok(Some(updated)),
            Err(PushError::Remote(e)) => {
                warn!("⚠️  Follow-up update of task {} failed, will retry: {e}", adopted.id);
                Ok(Some(adopted))
            }
            Err(e) => Err(e),
        }
    }

    /// Send the full state of a task the remote already knows, then mark it synced
    /// unless it changed while the request was in flight.
    async fn push_update(&self, task: &Task) -> Result<Task, PushError> {
        self.remote
            .update_task(task.remote_key(), RemoteTaskArgs::from_task(task))
            .await
            .map_err(PushError::Remote)?;

        let marked = self
            .storage
            .mark_synced_if_unchanged(&task.id, &task.updated_at)
            .await
            .map_err(PushError::Storage)?;
        if !marked {
            debug!("Task {} changed during push; leaving it unsynced", task.id);
        }
        Ok(Task {
            synced: marked,
            ..task.clone()
        })
    }
}
