//! tasksync - An offline-first task manager core
//!
//! This library keeps a durable local store of tasks and reconciles it with a
//! remote REST task store whenever connectivity allows. Every mutation lands
//! locally first; a per-record `synced` flag tracks what still has to reach the
//! remote store, and reconciliation passes push it when the network returns.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local database and data persistence
//! * [`remote`] - Remote task store client and in-process replacement
//! * [`connectivity`] - Online state and sync triggers
//! * [`sync`] - Synchronization engine
//! * [`utils`] - Utility functions and helpers

/// Configuration module for managing application settings
pub mod config;

/// Online/offline belief and sync trigger fan-out
pub mod connectivity;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Task image payloads and validation
pub mod image;

/// Logging setup
pub mod logger;

/// Startup cleanup of the local store
pub mod maintenance;

/// Domain models for tasks
pub mod models;

/// User-facing notifications
pub mod notify;

/// Remote task store client
pub mod remote;

/// Repository layer for database operations
pub mod repositories;

/// Task counts
pub mod stats;

/// Local storage layer
pub mod storage;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

/// Utility functions for date/time handling and other helpers
pub mod utils;

// Re-export entity models for convenient access
pub use entities::{setting, task, tombstone};
