//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods that work on a connection or a transaction alike.

pub mod setting;
pub mod task;
pub mod tombstone;

pub use setting::SettingRepository;
pub use task::TaskRepository;
pub use tombstone::TombstoneRepository;
