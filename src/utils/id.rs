//! Client-side identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::constants::LOCAL_ID_PREFIX;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate an identifier for a record created on this client.
///
/// Derived from the current time in microseconds plus a process-wide sequence, so ids
/// sort by creation time and never collide within one process even when the clock
/// does not advance between calls.
pub fn generate_local_id() -> String {
    let micros = Utc::now().timestamp_micros();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{LOCAL_ID_PREFIX}{micros}-{seq}")
}
