use log::{debug, warn};
use sea_orm::TransactionTrait;

use super::db::LocalStorage;
use super::error::{StorageError, StorageResult};
use super::normalize::normalize;
use crate::entities::task;
use crate::models::{NewTask, Task, TaskPatch};
use crate::remote::RemoteTask;
use crate::repositories::TaskRepository;
use crate::utils::datetime::{next_timestamp, now_timestamp};
use crate::utils::id::generate_local_id;

impl LocalStorage {
    /// Store a new task and return it with its identifier and timestamps.
    ///
    /// The caller validates input first. `synced` is true only for records that
    /// came straight from the remote store.
    pub async fn insert(&self, new_task: NewTask, synced: bool) -> StorageResult<Task> {
        self.ensure_initialized()?;

        let now = now_timestamp();
        let mut task = Task {
            id: new_task
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(generate_local_id),
            remote_id: None,
            title: new_task.title,
            description: new_task.description,
            completed: new_task.completed,
            priority: new_task.priority,
            image: new_task.image,
            photo: None,
            created_at: now.clone(),
            updated_at: now,
            synced,
        };
        task.refresh_photo();

        TaskRepository::insert(&self.conn, task::ActiveModel::from(&task)).await?;
        debug!("💾 Stored task {} ({})", task.id, task.title);
        Ok(task)
    }

    /// All tasks in creation order, normalized.
    ///
    /// Rows that needed repair are written back in their repaired form.
    pub async fn list_all(&self) -> StorageResult<Vec<Task>> {
        self.ensure_initialized()?;
        let rows = TaskRepository::get_all(&self.conn).await?;
        Ok(self.normalize_rows(rows).await)
    }

    /// Tasks the remote store has not confirmed, oldest first.
    pub async fn list_unsynced(&self) -> StorageResult<Vec<Task>> {
        self.ensure_initialized()?;
        let rows = TaskRepository::get_unsynced(&self.conn).await?;
        Ok(self.normalize_rows(rows).await)
    }

    /// Number of tasks the remote store has not confirmed.
    pub async fn count_unsynced(&self) -> StorageResult<u64> {
        self.ensure_initialized()?;
        Ok(TaskRepository::count_unsynced(&self.conn).await?)
    }

    /// A single task, normalized.
    pub async fn get(&self, id: &str) -> StorageResult<Option<Task>> {
        self.ensure_initialized()?;
        let Some(row) = TaskRepository::get_by_id(&self.conn, id).await? else {
            return Ok(None);
        };
        Ok(self.normalize_rows(vec![row]).await.into_iter().next())
    }

    /// Apply a patch, bump `updated_at` and mark the task unsynced.
    ///
    /// # Errors
    /// Returns `NotFound` if no task has this id
    pub async fn update(&self, id: &str, patch: TaskPatch) -> StorageResult<Task> {
        self.ensure_initialized()?;
        if id.trim().is_empty() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let id = id.to_string();
        let task = self
            .conn
            .transaction::<_, Task, StorageError>(|txn| {
                Box::pin(async move {
                    let row = TaskRepository::get_by_id(txn, &id)
                        .await?
                        .ok_or_else(|| StorageError::NotFound(id.clone()))?;

                    let mut task = normalize(row, &now_timestamp()).task;
                    patch.apply_to(&mut task);
                    task.updated_at = next_timestamp(Some(&task.updated_at));
                    task.synced = false;

                    TaskRepository::update(txn, task::ActiveModel::from(&task)).await?;
                    Ok(task)
                })
            })
            .await?;

        debug!("✏️  Updated task {}", task.id);
        Ok(task)
    }

    /// Mark a task synced unless it was modified after `expected_updated_at`.
    ///
    /// Returns whether the flag was set. A task that changed (or disappeared) in
    /// the meantime keeps its unsynced state.
    pub async fn mark_synced_if_unchanged(&self, id: &str, expected_updated_at: &str) -> StorageResult<bool> {
        self.ensure_initialized()?;
        Ok(TaskRepository::mark_synced_if_unchanged(&self.conn, id, expected_updated_at).await?)
    }

    /// Re-key a locally created task to the identifier the remote store assigned.
    ///
    /// Local field values are always kept. The task is marked synced only when it still
    /// has `expected_updated_at` and the remote echo carries the same values; otherwise
    /// (edited while the push was in flight, or a field the server dropped on create)
    /// it stays unsynced so its state is pushed again as an update.
    ///
    /// # Errors
    /// Returns `NotFound` if the local task was deleted in the meantime
    pub async fn adopt_remote(
        &self,
        local_id: &str,
        remote: &RemoteTask,
        expected_updated_at: Option<&str>,
    ) -> StorageResult<Task> {
        self.ensure_initialized()?;

        let local_id = local_id.to_string();
        let remote = remote.clone();
        let expected = expected_updated_at.map(str::to_string);

        let task = self
            .conn
            .transaction::<_, Task, StorageError>(|txn| {
                Box::pin(async move {
                    let row = TaskRepository::get_by_id(txn, &local_id)
                        .await?
                        .ok_or_else(|| StorageError::NotFound(local_id.clone()))?;
                    let local = normalize(row, &now_timestamp()).task;

                    let unchanged = expected.as_deref().map_or(true, |expected| expected == local.updated_at);
                    let confirmed = unchanged && remote_matches(&remote.to_task(&local.created_at), &local);
                    let task = Task {
                        id: remote.id.clone(),
                        remote_id: Some(remote.id.clone()),
                        synced: confirmed,
                        ..local
                    };

                    TaskRepository::delete_by_id(txn, &local_id).await?;
                    if local_id != task.id {
                        TaskRepository::delete_by_id(txn, &task.id).await?;
                    }
                    TaskRepository::insert(txn, task::ActiveModel::from(&task)).await?;
                    Ok(task)
                })
            })
            .await?;

        debug!("🔗 Task now tracked as remote {} (synced: {})", task.id, task.synced);
        Ok(task)
    }

    /// Delete a task.
    ///
    /// # Errors
    /// Returns `NotFound` if no task has this id
    pub async fn remove(&self, id: &str) -> StorageResult<()> {
        self.ensure_initialized()?;
        match TaskRepository::delete_by_id(&self.conn, id).await? {
            0 => Err(StorageError::NotFound(id.to_string())),
            _ => {
                debug!("🗑️  Removed task {id}");
                Ok(())
            }
        }
    }

    /// Normalize rows, writing repaired ones back.
    ///
    /// A failed write-back is logged; the repaired form is still returned.
    async fn normalize_rows(&self, rows: Vec<task::Model>) -> Vec<Task> {
        let now = now_timestamp();
        let mut tasks = Vec::with_capacity(rows.len());
        let mut repairs = Vec::new();

        for row in rows {
            let stored_id = row.id.clone();
            let normalized = normalize(row, &now);
            if normalized.repaired {
                repairs.push((stored_id, normalized.task.clone()));
            }
            tasks.push(normalized.task);
        }

        if !repairs.is_empty() {
            let count = repairs.len();
            match self.write_repairs(repairs).await {
                Ok(()) => warn!("🩹 Repaired {count} malformed task record(s)"),
                Err(e) => warn!("🩹 Could not write back {count} repaired task record(s): {e}"),
            }
        }
        tasks
    }

    async fn write_repairs(&self, repairs: Vec<(String, Task)>) -> StorageResult<()> {
        self.conn
            .transaction::<_, (), StorageError>(|txn| {
                Box::pin(async move {
                    for (stored_id, task) in repairs {
                        TaskRepository::delete_by_id(txn, &stored_id).await?;
                        TaskRepository::insert(txn, task::ActiveModel::from(&task)).await?;
                    }
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }
}

/// Whether the remote echo carries the user-visible fields of `local`.
fn remote_matches(echo: &Task, local: &Task) -> bool {
    echo.title == local.title
        && echo.description == local.description
        && echo.completed == local.completed
        && echo.priority == local.priority
        && echo.image == local.image
}
