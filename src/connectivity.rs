//! Connectivity monitor.
//!
//! Holds the current belief about network availability and fans out sync triggers.
//! The platform layer (or the CLI) reports changes; the monitor never checks the
//! remote store itself.

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{broadcast, watch};

/// Capacity of the trigger channel; slow subscribers see `Lagged` beyond this
const TRIGGER_CAPACITY: usize = 16;

/// Why a reconciliation pass was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Connectivity went from offline to online
    CameOnline,
    /// A background-sync signal from the platform
    BackgroundSync,
}

/// Cloneable handle over the online flag and the trigger channel
#[derive(Clone)]
pub struct ConnectivityMonitor {
    online: Arc<watch::Sender<bool>>,
    triggers: broadcast::Sender<SyncTrigger>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (online, _) = watch::channel(initially_online);
        let (triggers, _) = broadcast::channel(TRIGGER_CAPACITY);
        Self {
            online: Arc::new(online),
            triggers,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Record a connectivity change.
    ///
    /// Emits [`SyncTrigger::CameOnline`] only on an offline to online transition.
    pub fn set_online(&self, online: bool) {
        let mut came_online = false;
        let changed = self.online.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            came_online = online;
            *current = online;
            true
        });

        if !changed {
            return;
        }
        if came_online {
            info!("📶 Back online");
            self.emit(SyncTrigger::CameOnline);
        } else {
            info!("📴 Offline");
        }
    }

    /// Ask for a reconciliation pass, e.g. from a platform background task.
    pub fn request_background_sync(&self) {
        self.emit(SyncTrigger::BackgroundSync);
    }

    /// Receive future triggers.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncTrigger> {
        self.triggers.subscribe()
    }

    /// Observe the online flag.
    pub fn watch_online(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    fn emit(&self, trigger: SyncTrigger) {
        // No subscribers is fine; nothing is running a trigger loop
        if self.triggers.send(trigger).is_err() {
            debug!("No listeners for {trigger:?}");
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
