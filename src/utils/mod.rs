//! Utility modules for tasksync.
//!
//! Small helpers shared across the storage, remote and sync layers.
//!
//! # Available Utilities
//!
//! - [`datetime`] - Timestamp formatting, parsing and monotonic bumping
//! - [`id`] - Client-side identifier generation

pub mod datetime;
pub mod id;
