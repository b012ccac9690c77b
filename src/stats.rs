//! Aggregate task counts.

use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task};

/// Counts shown on the dashboard; also the body of `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Open (not completed) tasks with high priority
    pub high_priority: usize,
}

/// Compute stats over a task collection.
pub fn compute_stats(tasks: &[Task]) -> TaskStats {
    tally(tasks.iter().map(|task| (task.completed, task.priority)))
}

/// Compute stats from `(completed, priority)` pairs.
pub fn tally<I>(records: I) -> TaskStats
where
    I: IntoIterator<Item = (bool, Priority)>,
{
    let mut stats = TaskStats::default();
    for (completed, priority) in records {
        stats.total += 1;
        if completed {
            stats.completed += 1;
        } else if priority == Priority::High {
            stats.high_priority += 1;
        }
    }
    stats.pending = stats.total - stats.completed;
    stats
}
