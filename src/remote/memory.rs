//! In-process remote store.
//!
//! Behaves like the REST server (assigned ids, data-URI stripping, the 5 MiB image
//! ceiling, stats) but keeps its records in an owned collection. Each instance is
//! independent, so tests and offline demos can run side by side.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{HealthStatus, RemoteError, RemoteStore, RemoteTask, RemoteTaskArgs};
use crate::stats::{tally, TaskStats};
use crate::utils::datetime::now_timestamp;

/// Owned, injectable implementation of [`RemoteStore`].
pub struct InMemoryRemote {
    tasks: Mutex<Vec<RemoteTask>>,
    available: AtomicBool,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage. While unavailable every call fails with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Copy of the stored records.
    pub async fn snapshot(&self) -> Vec<RemoteTask> {
        self.tasks.lock().await.clone()
    }

    /// Insert records as-is, e.g. ones created by another client.
    pub async fn seed(&self, records: impl IntoIterator<Item = RemoteTask>) {
        self.tasks.lock().await.extend(records);
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable)
        }
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    fn remote_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<HealthStatus, RemoteError> {
        self.check_available()?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            message: "Task server is running".to_string(),
            tasks_count: self.tasks.lock().await.len(),
        })
    }

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, RemoteError> {
        self.check_available()?;
        Ok(self.snapshot().await)
    }

    async fn create_task(&self, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError> {
        self.check_available()?;
        args.validate(true)?;

        let now = now_timestamp();
        let task = RemoteTask {
            id: Uuid::new_v4().to_string(),
            title: args.title.as_deref().unwrap_or_default().trim().to_string(),
            description: args.description.clone().unwrap_or_default(),
            completed: args.completed.unwrap_or(false),
            priority: args.priority.unwrap_or_default(),
            image: args.image_change()?.flatten(),
            photo: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        self.tasks.lock().await.push(task.clone());
        debug!("🌐 [memory] created {}", task.id);
        Ok(task)
    }

    async fn update_task(&self, remote_id: &str, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError> {
        self.check_available()?;
        args.validate(false)?;
        let image_change = args.image_change()?;

        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == remote_id)
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))?;

        if let Some(title) = args.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = args.description {
            task.description = description;
        }
        if let Some(completed) = args.completed {
            task.completed = completed;
        }
        if let Some(priority) = args.priority {
            task.priority = priority;
        }
        if let Some(image) = image_change {
            task.image = image;
            task.photo = None;
        }
        task.updated_at = Some(now_timestamp());

        Ok(task.clone())
    }

    async fn delete_task(&self, remote_id: &str) -> Result<(), RemoteError> {
        self.check_available()?;
        let mut tasks = self.tasks.lock().await;
        let index = tasks
            .iter()
            .position(|task| task.id == remote_id)
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))?;
        tasks.remove(index);
        Ok(())
    }

    async fn stats(&self) -> Result<TaskStats, RemoteError> {
        self.check_available()?;
        let tasks = self.tasks.lock().await;
        Ok(tally(tasks.iter().map(|task| (task.completed, task.priority))))
    }
}
