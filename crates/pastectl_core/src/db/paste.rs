//! Paste storage operations backed by redb.

use super::{tables::*, PasteStore, RedbStore};
use crate::{error::StoreError, models::paste::Paste};
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};

pub(crate) fn expiry_key(expire_at: DateTime<Utc>) -> u64 {
    // Pre-epoch timestamps clamp to zero; they sort first and are always expired.
    expire_at.timestamp_millis().max(0) as u64
}

pub(crate) fn deserialize_paste(bytes: &[u8]) -> Result<Paste, bincode::Error> {
    bincode::deserialize(bytes)
}

impl RedbStore {
    /// Read-modify-write a single row inside one write transaction.
    ///
    /// redb serializes write transactions, so `apply` never races another
    /// writer for the same row.
    fn modify<F>(&self, id: &str, apply: F) -> Result<Paste, StoreError>
    where
        F: FnOnce(&mut Paste),
    {
        let write_txn = self.db.begin_write()?;
        let paste = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let Some(guard) = pastes.get(id)? else {
                return Err(StoreError::NotFound);
            };
            let mut paste = deserialize_paste(guard.value())?;
            drop(guard);

            apply(&mut paste);

            let encoded = bincode::serialize(&paste)?;
            pastes.insert(id, encoded.as_slice())?;
            paste
        };
        write_txn.commit()?;
        Ok(paste)
    }
}

impl PasteStore for RedbStore {
    fn create(&self, paste: &Paste) -> Result<(), StoreError> {
        let encoded = bincode::serialize(paste)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut by_expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;

            if pastes.get(paste.id.as_str())?.is_some() {
                return Err(StoreError::UniqueViolation {
                    id: paste.id.clone(),
                });
            }

            pastes.insert(paste.id.as_str(), encoded.as_slice())?;
            if let Some(expire_at) = paste.expire_at {
                by_expiry.insert((expiry_key(expire_at), paste.id.as_str()), ())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Paste>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let pastes = read_txn.open_table(PASTES)?;
        match pastes.get(id)? {
            Some(value) => Ok(Some(deserialize_paste(value.value())?)),
            None => Ok(None),
        }
    }

    fn update(&self, id: &str, content: &str, language: &str) -> Result<Paste, StoreError> {
        self.modify(id, |paste| {
            paste.content = content.to_string();
            paste.language = language.to_string();
        })
    }

    fn increment_views(&self, id: &str, delta: u64) -> Result<Paste, StoreError> {
        self.modify(id, |paste| {
            paste.views = paste.views.saturating_add(delta);
        })
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = expiry_key(now);

        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut pastes = write_txn.open_table(PASTES)?;
            let mut by_expiry = write_txn.open_table(PASTES_BY_EXPIRY)?;

            let mut expired: Vec<(u64, String)> = Vec::new();
            for item in by_expiry.iter()? {
                let (key, _) = item?;
                let (millis, id) = key.value();
                if millis >= cutoff {
                    break;
                }
                expired.push((millis, id.to_string()));
            }

            for (millis, id) in &expired {
                let _ = by_expiry.remove((*millis, id.as_str()))?;
                let _ = pastes.remove(id.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
