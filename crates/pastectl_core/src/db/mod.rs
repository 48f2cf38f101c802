//! Persistence layer: the paste store contract and its redb backend.

/// Paste row operations for [`RedbStore`].
pub mod paste;
/// redb table definitions.
pub mod tables;

use crate::error::StoreError;
use crate::models::paste::Paste;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Narrow storage contract consumed by [`crate::PasteService`].
///
/// Implementations must be safe to share between threads and must apply
/// each operation atomically: an update never exposes new content with an
/// old language, and concurrent view increments never lose counts.
pub trait PasteStore: Send + Sync {
    /// Insert a new row.
    ///
    /// # Errors
    /// Returns [`StoreError::UniqueViolation`] when `paste.id` already exists.
    fn create(&self, paste: &Paste) -> Result<(), StoreError>;

    /// Fetch a row by id, regardless of its expiry.
    ///
    /// # Returns
    /// `Ok(None)` when no row exists.
    fn get(&self, id: &str) -> Result<Option<Paste>, StoreError>;

    /// Replace content and language in one write.
    ///
    /// # Returns
    /// The stored row after the write.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when no row exists.
    fn update(&self, id: &str, content: &str, language: &str) -> Result<Paste, StoreError>;

    /// Add `delta` to the view counter in one write.
    ///
    /// # Returns
    /// The stored row after the write.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when no row exists.
    fn increment_views(&self, id: &str, delta: u64) -> Result<Paste, StoreError>;

    /// Remove every row whose `expire_at` lies before `now`.
    ///
    /// # Returns
    /// Number of rows removed.
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

impl<S: PasteStore + ?Sized> PasteStore for Arc<S> {
    fn create(&self, paste: &Paste) -> Result<(), StoreError> {
        (**self).create(paste)
    }

    fn get(&self, id: &str) -> Result<Option<Paste>, StoreError> {
        (**self).get(id)
    }

    fn update(&self, id: &str, content: &str, language: &str) -> Result<Paste, StoreError> {
        (**self).update(id, content, language)
    }

    fn increment_views(&self, id: &str, delta: u64) -> Result<Paste, StoreError> {
        (**self).increment_views(id, delta)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        (**self).delete_expired(now)
    }
}

/// redb-backed [`PasteStore`].
///
/// Cloning is cheap and shares the underlying database handle.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<redb::Database>,
}

impl RedbStore {
    /// Open (or create) the store inside directory `path`.
    ///
    /// # Returns
    /// A store with all tables initialized.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or redb cannot
    /// open the database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = path.as_ref();
        if let Err(err) = std::fs::create_dir_all(dir) {
            tracing::warn!("Failed to create database directory {}: {}", dir.display(), err);
        }
        let db = redb::Database::create(dir.join(tables::REDB_FILE_NAME))?;
        tracing::info!("Opened paste store at {}", dir.display());
        Self::from_database(db)
    }

    /// Open a volatile store held entirely in memory.
    ///
    /// # Errors
    /// Returns an error when table initialization fails.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = redb::Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::from_database(db)
    }

    fn from_database(db: redb::Database) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(tables::PASTES)?;
        write_txn.open_table(tables::PASTES_BY_EXPIRY)?;
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}
