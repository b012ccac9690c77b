//! Periodic cleanup of the local store.
//!
//! Checked once at startup: when the last cleanup is older than the configured
//! interval and nothing is waiting to be pushed, the task tables are recreated.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::constants::LAST_MAINTENANCE_KEY;
use crate::storage::LocalStorage;
use crate::utils::datetime::{format_timestamp, is_older_than_days, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceOutcome {
    /// Interval is 0
    Disabled,
    /// No usable previous cleanup time; stamped now, nothing reset
    FirstRun,
    /// Last cleanup is recent enough
    NotDue,
    /// Due, but local changes have not reached the remote store yet
    Postponed { unsynced: u64, pending_deletes: usize },
    /// Tables recreated
    Reset,
}

/// Run the startup maintenance check against the current time.
pub async fn run_startup_maintenance(storage: &LocalStorage, interval_days: u64) -> Result<MaintenanceOutcome> {
    run_maintenance_at(storage, interval_days, Utc::now()).await
}

/// Run the maintenance check as of `now`.
pub async fn run_maintenance_at(
    storage: &LocalStorage,
    interval_days: u64,
    now: DateTime<Utc>,
) -> Result<MaintenanceOutcome> {
    if interval_days == 0 {
        return Ok(MaintenanceOutcome::Disabled);
    }

    let last = storage
        .get_setting(LAST_MAINTENANCE_KEY)
        .await
        .context("Failed to read last maintenance time")?;

    let Some(last) = last.as_deref().and_then(parse_timestamp) else {
        stamp(storage, now).await?;
        return Ok(MaintenanceOutcome::FirstRun);
    };

    if !is_older_than_days(last, now, interval_days) {
        return Ok(MaintenanceOutcome::NotDue);
    }

    let unsynced = storage.count_unsynced().await.context("Failed to count unsynced tasks")?;
    let pending_deletes = storage
        .list_tombstones()
        .await
        .context("Failed to list pending deletions")?
        .len();
    if unsynced > 0 || pending_deletes > 0 {
        warn!("🧹 Maintenance postponed: {unsynced} unsynced tasks, {pending_deletes} pending deletions");
        return Ok(MaintenanceOutcome::Postponed {
            unsynced,
            pending_deletes,
        });
    }

    storage.reset_schema().await.context("Failed to reset local store")?;
    stamp(storage, now).await?;
    info!("🧹 Local store maintenance complete");
    Ok(MaintenanceOutcome::Reset)
}

async fn stamp(storage: &LocalStorage, now: DateTime<Utc>) -> Result<()> {
    storage
        .set_setting(LAST_MAINTENANCE_KEY, &format_timestamp(now))
        .await
        .context("Failed to record maintenance time")
}
