//! Local storage module for task persistence
//!
//! This module provides database operations using SeaORM for:
//! - Tasks (with read-time normalization of drifted rows)
//! - Tombstones for deletions the remote store has not confirmed
//! - Persisted settings such as the last maintenance time

pub mod db;
pub mod error;
pub mod normalize;
pub mod settings;
pub mod tasks;
pub mod tombstones;

pub use db::LocalStorage;
pub use error::{StorageError, StorageResult};
