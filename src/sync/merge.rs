//! Merged read view of remote and local records.

use std::collections::HashSet;

use crate::models::Task;
use crate::remote::RemoteTask;
use crate::storage::tombstones::Tombstone;

/// Build the task list shown to the user from the remote list and the local store.
///
/// - Remote records are the base, in remote order
/// - A remote record whose local copy is unsynced is shown as the local copy
/// - Unsynced local records the remote does not know yet are appended
/// - Synced local records missing remotely are gone (deleted elsewhere)
/// - Anything deleted locally and still pending remote deletion is hidden
pub fn merge_views(remote: Vec<RemoteTask>, local: Vec<Task>, tombstones: &[Tombstone], now: &str) -> Vec<Task> {
    let deleted: HashSet<&str> = tombstones
        .iter()
        .flat_map(|tombstone| [tombstone.id.as_str(), tombstone.remote_id.as_str()])
        .collect();

    let unsynced: Vec<Task> = local.into_iter().filter(|task| !task.synced).collect();
    let mut shown = vec![false; unsynced.len()];
    let mut merged = Vec::with_capacity(remote.len() + unsynced.len());

    for record in remote {
        if deleted.contains(record.id.as_str()) {
            continue;
        }
        let local_copy = unsynced
            .iter()
            .position(|task| task.id == record.id || task.remote_id.as_deref() == Some(record.id.as_str()));
        match local_copy {
            Some(index) if !shown[index] => {
                shown[index] = true;
                merged.push(unsynced[index].clone());
            }
            Some(_) => {}
            None => merged.push(record.to_task(now)),
        }
    }

    merged.extend(
        unsynced
            .into_iter()
            .zip(shown)
            .filter(|(task, shown)| !shown && !deleted.contains(task.id.as_str()))
            .map(|(task, _)| task),
    );
    merged
}
