//! Constants used throughout the application
//!
//! This module centralizes magic strings, notification text, and other constant values
//! to improve maintainability and consistency.

// Image limits
/// Largest decoded image payload accepted for remote-bound writes (5 MiB, inclusive)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// MIME values recognized as images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
];

// Identifiers
/// Prefix of client-generated task identifiers
pub const LOCAL_ID_PREFIX: &str = "local-";

// Persisted settings keys
/// Timestamp of the last maintenance reset of the local store
pub const LAST_MAINTENANCE_KEY: &str = "last_maintenance_at";

// Remote defaults
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// Sync defaults
pub const DEFAULT_MANUAL_SYNC_COOLDOWN_SECS: u64 = 5;
pub const DEFAULT_MAINTENANCE_INTERVAL_DAYS: u64 = 7;

// Success Messages
pub const SUCCESS_TASK_ADDED: &str = "✅ Task added";
pub const SUCCESS_TASK_COMPLETED: &str = "✅ Task completed";
pub const SUCCESS_TASK_UPDATED: &str = "✅ Task updated";
pub const SUCCESS_TASK_DELETED: &str = "✅ Task deleted";
pub const SUCCESS_SYNC_COMPLETED: &str = "✅ Sync completed";

// Error Messages
pub const ERROR_SYNC_FAILED: &str = "❌ Sync failed";
pub const ERROR_TASK_NOT_FOUND: &str = "❌ Task not found";

// Status Messages
pub const INFO_SYNC_SKIPPED_OFFLINE: &str = "📴 Offline, sync skipped";
pub const INFO_SYNC_SKIPPED_BUSY: &str = "⏳ Sync already in progress";
pub const INFO_SYNC_SKIPPED_COOLDOWN: &str = "⏳ Sync requested too recently, try again shortly";
pub const INFO_REMOTE_UNREACHABLE: &str = "📴 Remote store unreachable, working locally";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
