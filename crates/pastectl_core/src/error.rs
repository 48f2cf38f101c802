//! Error types for paste storage and lifecycle logic.
use thiserror::Error;

/// Errors reported by a [`crate::db::PasteStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A row with the candidate id already exists.
    #[error("Paste id '{id}' already exists")]
    UniqueViolation { id: String },

    #[error("Paste not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl From<redb::DatabaseError> for StoreError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}

/// Top-level application error type for the paste lifecycle.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid expire format: '{0}'")]
    InvalidExpiryFormat(String),

    #[error("Paste not found")]
    NotFound,

    #[error("Paste has expired")]
    Expired,

    #[error("Failed to generate a unique id after {attempts} attempts")]
    IdGenerationExhausted { attempts: usize },

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}
