//! Synchronization service module for the tasksync core.
//!
//! This module provides the [`SyncService`] struct which keeps the local store and the
//! remote task store consistent. Every mutation lands in the local store first and is
//! then pushed when the remote is reachable; anything that could not be pushed stays
//! `synced = false` until a later reconciliation pass picks it up.
//!
//! The sync service acts as the main data layer for the application, offering:
//! - Local-first CRUD operations that never fail because the remote is down
//! - A merged read view of remote and not-yet-synced local records
//! - Reconciliation passes triggered by connectivity changes, background signals,
//!   a periodic timer or (debounced) manual requests

pub mod merge;
mod push;
pub mod stats;
pub mod tasks;

use std::future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::constants::{
    INFO_REMOTE_UNREACHABLE, INFO_SYNC_SKIPPED_BUSY, INFO_SYNC_SKIPPED_COOLDOWN, INFO_SYNC_SKIPPED_OFFLINE,
};
use crate::models::ValidationError;
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::remote::{RemoteError, RemoteStore};
use crate::storage::{LocalStorage, StorageError};

use push::PushError;

/// Errors surfaced to callers of the sync service.
///
/// Remote failures never appear here; they degrade to local-only behavior.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Represents the current status of a synchronization operation.
///
/// This enum is used to communicate the state of sync operations to the UI,
/// allowing for proper status indicators and error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No pass has completed yet
    Idle,
    /// A reconciliation pass is currently running
    InProgress,
    /// The last pass completed
    Success,
    /// The last pass failed
    Error {
        /// Human-readable error message describing what went wrong
        message: String,
    },
}

/// Why `sync_now` did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySyncing,
    Offline,
    Cooldown,
}

/// Counts from one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records the remote accepted and that are now marked synced
    pub pushed: usize,
    /// Records whose push failed; they stay unsynced
    pub failed: usize,
    /// Records the remote accepted but that were edited during the push
    pub deferred: usize,
    /// Pending remote deletions that went through
    pub tombstones_cleared: usize,
}

/// Result of a call to [`SyncService::sync_now`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    /// Online, but the remote store did not answer the health check
    Unreachable,
    Completed(SyncReport),
    Failed { message: String },
}

/// Tunables taken from the `[sync]` config section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub manual_sync_cooldown: Duration,
    /// Periodic pass interval; `None` disables the timer
    pub auto_sync_interval: Option<Duration>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            manual_sync_cooldown: Duration::from_secs(config.manual_sync_cooldown_secs),
            auto_sync_interval: (config.auto_sync_interval_minutes > 0)
                .then(|| Duration::from_secs(config.auto_sync_interval_minutes.saturating_mul(60))),
        }
    }
}

#[derive(Debug, Default)]
struct SyncState {
    last_sync_time: Option<DateTime<Utc>>,
    last_sync_error: Option<String>,
    last_manual_sync: Option<Instant>,
}

/// Service that keeps local storage and the remote task store in sync.
///
/// Cheap to clone; clones share storage, remote, state and the syncing flag.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use tasksync::connectivity::ConnectivityMonitor;
/// use tasksync::models::NewTask;
/// use tasksync::remote::InMemoryRemote;
/// use tasksync::storage::LocalStorage;
/// use tasksync::sync::SyncService;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = Arc::new(LocalStorage::in_memory().await?);
/// let sync = SyncService::new(storage, Arc::new(InMemoryRemote::new()), ConnectivityMonitor::new(true));
///
/// let task = sync.add_task(NewTask::new("Buy milk")).await?;
/// assert!(task.synced);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncService {
    storage: Arc<LocalStorage>,
    remote: Arc<dyn RemoteStore>,
    connectivity: ConnectivityMonitor,
    notifier: Arc<dyn Notifier>,
    settings: SyncSettings,
    sync_in_progress: Arc<AtomicBool>,
    state: Arc<Mutex<SyncState>>,
}

/// Holds the syncing flag for the duration of a pass; dropping it releases the flag
/// on every exit path, including cancellation of the future.
struct SyncingGuard(Arc<AtomicBool>);

impl SyncingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for SyncingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A failure that aborts a reconciliation pass
#[derive(Debug, thiserror::Error)]
enum PassError {
    #[error("local store: {0}")]
    Storage(#[from] StorageError),

    #[error("remote store: {0}")]
    Remote(#[from] RemoteError),
}

impl SyncService {
    /// Creates a new `SyncService` with the default notifier and settings.
    pub fn new(storage: Arc<LocalStorage>, remote: Arc<dyn RemoteStore>, connectivity: ConnectivityMonitor) -> Self {
        Self {
            storage,
            remote,
            connectivity,
            notifier: Arc::new(LogNotifier),
            settings: SyncSettings::default(),
            sync_in_progress: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn storage(&self) -> &Arc<LocalStorage> {
        &self.storage
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Checks if a reconciliation pass is currently running.
    pub fn is_syncing(&self) -> bool {
        self.sync_in_progress.load(Ordering::SeqCst)
    }

    /// When the last pass completed.
    pub async fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_sync_time
    }

    /// Error captured by the last pass, cleared when the next one starts.
    pub async fn last_sync_error(&self) -> Option<String> {
        self.state.lock().await.last_sync_error.clone()
    }

    pub async fn status(&self) -> SyncStatus {
        if self.is_syncing() {
            return SyncStatus::InProgress;
        }
        let state = self.state.lock().await;
        match (&state.last_sync_error, state.last_sync_time) {
            (Some(message), _) => SyncStatus::Error {
                message: message.clone(),
            },
            (None, Some(_)) => SyncStatus::Success,
            (None, None) => SyncStatus::Idle,
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// The pass:
    /// 1. Refuses to start while offline or while another pass runs
    /// 2. Stops quietly if the remote store fails its health check
    /// 3. Retries pending remote deletions
    /// 4. Pushes every unsynced record; one record failing does not stop the rest
    /// 5. With nothing to push, lists the remote store as a liveness check
    ///
    /// Failures are reported in the returned outcome and in [`last_sync_error`](Self::last_sync_error).
    pub async fn sync_now(&self) -> SyncOutcome {
        if !self.connectivity.is_online() {
            info!("{INFO_SYNC_SKIPPED_OFFLINE}");
            return SyncOutcome::Skipped(SkipReason::Offline);
        }
        let Some(_guard) = SyncingGuard::acquire(&self.sync_in_progress) else {
            info!("{INFO_SYNC_SKIPPED_BUSY}");
            return SyncOutcome::Skipped(SkipReason::AlreadySyncing);
        };

        self.state.lock().await.last_sync_error = None;
        info!("🔄 Starting sync process...");

        if !self.remote_reachable().await {
            info!("{INFO_REMOTE_UNREACHABLE}");
            return SyncOutcome::Unreachable;
        }

        match self.reconcile().await {
            Ok(report) => {
                self.state.lock().await.last_sync_time = Some(Utc::now());
                info!(
                    "✅ Sync finished: {} pushed, {} failed, {} deferred, {} deletions confirmed",
                    report.pushed, report.failed, report.deferred, report.tombstones_cleared
                );
                self.notifier.notify(Notification::SyncCompleted { pushed: report.pushed });
                SyncOutcome::Completed(report)
            }
            Err(e) => {
                let message = e.to_string();
                error!("❌ Sync failed: {message}");
                self.state.lock().await.last_sync_error = Some(message.clone());
                self.notifier.notify(Notification::SyncFailed {
                    message: message.clone(),
                });
                SyncOutcome::Failed { message }
            }
        }
    }

    /// User-initiated sync, ignored when repeated within the cooldown window.
    pub async fn request_manual_sync(&self) -> SyncOutcome {
        {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            if let Some(last) = state.last_manual_sync {
                if now.duration_since(last) < self.settings.manual_sync_cooldown {
                    info!("{INFO_SYNC_SKIPPED_COOLDOWN}");
                    return SyncOutcome::Skipped(SkipReason::Cooldown);
                }
            }
            state.last_manual_sync = Some(now);
        }
        self.sync_now().await
    }

    /// Run a pass on every connectivity trigger and on the auto-sync timer.
    ///
    /// The loop runs until the returned handle is aborted.
    pub fn spawn_trigger_loop(&self) -> JoinHandle<()> {
        let service = self.clone();
        let mut triggers = self.connectivity.subscribe();
        let interval = self.settings.auto_sync_interval;

        tokio::spawn(async move {
            let mut ticker = interval.map(|period| {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });

            loop {
                let tick = async {
                    match ticker.as_mut() {
                        Some(ticker) => {
                            ticker.tick().await;
                        }
                        None => future::pending::<()>().await,
                    }
                };

                tokio::select! {
                    trigger = triggers.recv() => match trigger {
                        Ok(trigger) => {
                            debug!("Sync triggered by {trigger:?}");
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("⚠️  Missed {skipped} sync triggers");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    () = tick => {
                        debug!("Sync triggered by timer");
                    }
                }

                service.sync_now().await;
            }
            debug!("Sync trigger loop stopped");
        })
    }

    /// Reachability gate: online according to the monitor and a healthy check.
    pub(crate) async fn remote_reachable(&self) -> bool {
        if !self.connectivity.is_online() {
            return false;
        }
        match self.remote.health_check().await {
            Ok(_) => true,
            Err(e) => {
                warn!("⚠️  Remote health check failed: {e}");
                false
            }
        }
    }

    async fn reconcile(&self) -> Result<SyncReport, PassError> {
        let mut report = SyncReport {
            tombstones_cleared: self.retry_remote_deletes().await?,
            ..SyncReport::default()
        };

        let unsynced = self.storage.list_unsynced().await?;

        if unsynced.is_empty() {
            let remote = self.remote.list_tasks().await?;
            debug!("Nothing to push; remote holds {} tasks", remote.len());
            return Ok(report);
        }

        info!("📤 Pushing {} unsynced tasks", unsynced.len());
        for task in &unsynced {
            match self.push_record(task).await {
                Ok(Some(pushed)) if pushed.synced => report.pushed += 1,
                Ok(_) => report.deferred += 1,
                Err(PushError::Remote(e)) => {
                    warn!("⚠️  Could not push task {}: {e}", task.id);
                    report.failed += 1;
                }
                Err(PushError::Storage(e)) => return Err(e.into()),
            }
        }
        Ok(report)
    }

    async fn retry_remote_deletes(&self) -> Result<usize, StorageError> {
        let mut cleared = 0;
        for tombstone in self.storage.list_tombstones().await? {
            match self.remote.delete_task(&tombstone.remote_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!("⚠️  Remote delete of {} still pending: {e}", tombstone.remote_id);
                    continue;
                }
            }
            self.storage.clear_tombstone(&tombstone.id).await?;
            cleared += 1;
        }
        Ok(cleared)
    }
}
