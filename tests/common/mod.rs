#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tasksync::connectivity::ConnectivityMonitor;
use tasksync::notify::{Notification, Notifier};
use tasksync::remote::{HealthStatus, InMemoryRemote, RemoteError, RemoteStore, RemoteTask, RemoteTaskArgs};
use tasksync::stats::TaskStats;
use tasksync::storage::LocalStorage;
use tasksync::sync::{SyncService, SyncSettings};

/// Wraps [`InMemoryRemote`] and fails selected calls.
#[derive(Default)]
pub struct FlakyRemote {
    pub inner: InMemoryRemote,
    failing_titles: Mutex<HashSet<String>>,
    fail_deletes: AtomicBool,
    fail_updates: AtomicBool,
    fail_lists: AtomicBool,
    ignore_completed_on_create: AtomicBool,
    health_delay_ms: AtomicU64,
}

impl FlakyRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and updates carrying this title fail with a 500.
    pub fn fail_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn heal_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().remove(title);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Creates store every task as open, like a server that only accepts
    /// title, description, priority and image on create.
    pub fn set_ignore_completed_on_create(&self, ignore: bool) {
        self.ignore_completed_on_create.store(ignore, Ordering::SeqCst);
    }

    pub fn set_health_delay(&self, delay: Duration) {
        self.health_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check_title(&self, args: &RemoteTaskArgs) -> Result<(), RemoteError> {
        let failing = self.failing_titles.lock().unwrap();
        match &args.title {
            Some(title) if failing.contains(title) => Err(server_error()),
            _ => Ok(()),
        }
    }
}

fn server_error() -> RemoteError {
    RemoteError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

#[async_trait]
impl RemoteStore for FlakyRemote {
    fn remote_type(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> Result<HealthStatus, RemoteError> {
        let delay = self.health_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.health_check().await
    }

    async fn list_tasks(&self) -> Result<Vec<RemoteTask>, RemoteError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.inner.list_tasks().await
    }

    async fn create_task(&self, mut args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError> {
        self.check_title(&args)?;
        if self.ignore_completed_on_create.load(Ordering::SeqCst) {
            args.completed = None;
        }
        self.inner.create_task(args).await
    }

    async fn update_task(&self, remote_id: &str, args: RemoteTaskArgs) -> Result<RemoteTask, RemoteError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.check_title(&args)?;
        self.inner.update_task(remote_id, args).await
    }

    async fn delete_task(&self, remote_id: &str) -> Result<(), RemoteError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        self.inner.delete_task(remote_id).await
    }

    async fn stats(&self) -> Result<TaskStats, RemoteError> {
        self.inner.stats().await
    }
}

/// Keeps every notification for inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.events.lock().unwrap().push(notification);
    }
}

pub struct Harness {
    pub sync: SyncService,
    pub storage: Arc<LocalStorage>,
    pub remote: Arc<FlakyRemote>,
    pub connectivity: ConnectivityMonitor,
    pub notifier: Arc<RecordingNotifier>,
}

pub async fn harness(online: bool) -> Harness {
    harness_with(online, SyncSettings::default()).await
}

pub async fn harness_with(online: bool, settings: SyncSettings) -> Harness {
    let storage = Arc::new(LocalStorage::in_memory().await.unwrap());
    let remote = Arc::new(FlakyRemote::new());
    let connectivity = ConnectivityMonitor::new(online);
    let notifier = Arc::new(RecordingNotifier::default());

    let sync = SyncService::new(storage.clone(), remote.clone(), connectivity.clone())
        .with_notifier(notifier.clone())
        .with_settings(settings);

    Harness {
        sync,
        storage,
        remote,
        connectivity,
        notifier,
    }
}
