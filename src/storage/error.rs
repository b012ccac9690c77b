//! Storage error handling
//!
//! Local durability problems. These reach the immediate caller because nothing
//! sits beneath the local store to fall back on.

use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

/// Errors that can occur during local store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Schema setup has not completed (or a reset is in progress)
    #[error("Local store is not initialized")]
    NotInitialized,

    /// No record with this id
    #[error("Task not found: {0}")]
    NotFound(String),

    /// The database rejected or failed the operation
    #[error("Transaction failed: {0}")]
    TransactionFailed(#[from] DbErr),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<TransactionError<StorageError>> for StorageError {
    fn from(error: TransactionError<StorageError>) -> Self {
        match error {
            TransactionError::Connection(db_err) => StorageError::TransactionFailed(db_err),
            TransactionError::Transaction(inner) => inner,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
