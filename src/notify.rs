//! User-facing notifications.
//!
//! The sync engine reports noteworthy events through a [`Notifier`]. A UI layer
//! plugs in toasts or haptics; the default just logs.

use log::{info, warn};

use crate::constants::{ERROR_SYNC_FAILED, SUCCESS_SYNC_COMPLETED, SUCCESS_TASK_ADDED, SUCCESS_TASK_COMPLETED};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TaskAdded { title: String },
    TaskCompleted { title: String },
    SyncCompleted { pushed: usize },
    SyncFailed { message: String },
}

impl Notification {
    /// One-line text for display.
    pub fn message(&self) -> String {
        match self {
            Notification::TaskAdded { title } => format!("{SUCCESS_TASK_ADDED}: {title}"),
            Notification::TaskCompleted { title } => format!("{SUCCESS_TASK_COMPLETED}: {title}"),
            Notification::SyncCompleted { pushed } => format!("{SUCCESS_SYNC_COMPLETED} ({pushed} pushed)"),
            Notification::SyncFailed { message } => format!("{ERROR_SYNC_FAILED}: {message}"),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::SyncFailed { .. } => warn!("{}", notification.message()),
            _ => info!("{}", notification.message()),
        }
    }
}
