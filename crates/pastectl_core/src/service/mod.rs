//! Paste lifecycle: creation with collision retry, expiry-aware reads,
//! updates, view accounting and expiry sweeps.

use crate::constants::{DEFAULT_LANGUAGE, MAX_ID_ATTEMPTS, PASTE_ID_LENGTH};
use crate::db::PasteStore;
use crate::error::{AppError, StoreError};
use crate::expiry;
use crate::ids::{generate_id, is_well_formed_id};
use crate::models::paste::Paste;
use chrono::{DateTime, Duration, Utc};

/// Orchestrates paste operations on top of a [`PasteStore`].
pub struct PasteService<S> {
    store: S,
    id_length: usize,
    max_attempts: usize,
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::InvalidArgument(format!("{} is required", field)));
    }
    Ok(())
}

fn store_failure(operation: &'static str, id: &str, err: StoreError) -> AppError {
    if !matches!(err, StoreError::NotFound) {
        tracing::error!(operation, paste_id = %id, "Paste store failure: {}", err);
    }
    err.into()
}

impl<S: PasteStore> PasteService<S> {
    /// Build a service with default id length and retry budget.
    pub fn new(store: S) -> Self {
        Self {
            store,
            id_length: PASTE_ID_LENGTH,
            max_attempts: MAX_ID_ATTEMPTS,
        }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a paste from an expiry token (`1h`, `24h`, `7d`, `never`, ...).
    ///
    /// # Arguments
    /// - `content`: Paste body; must be non-empty.
    /// - `language`: Syntax tag; must be non-empty.
    /// - `expire`: Optional expiry token; `None` means never.
    ///
    /// # Returns
    /// The persisted paste with `views == 0`.
    ///
    /// # Errors
    /// - [`AppError::InvalidArgument`] for empty content or language.
    /// - [`AppError::InvalidExpiryFormat`] for an unrecognized token.
    /// - [`AppError::IdGenerationExhausted`] when every candidate id collided.
    /// - [`AppError::Store`] for any other storage failure.
    pub fn create(
        &self,
        content: &str,
        language: &str,
        expire: Option<&str>,
    ) -> Result<Paste, AppError> {
        require_non_empty("content", content)?;
        require_non_empty("language", language)?;
        let lifetime = match expire {
            Some(token) => expiry::resolve(token)?,
            None => None,
        };
        self.create_with_lifetime(content, language, lifetime)
    }

    /// Create a paste that lives for `lifetime` (or forever when `None`).
    ///
    /// Candidate ids are generated up to the retry budget; a uniqueness
    /// violation triggers a fresh id, any other store error aborts.
    ///
    /// # Errors
    /// [`AppError::InvalidArgument`] for a zero or negative `lifetime`,
    /// otherwise see [`PasteService::create`].
    pub fn create_with_lifetime(
        &self,
        content: &str,
        language: &str,
        lifetime: Option<Duration>,
    ) -> Result<Paste, AppError> {
        require_non_empty("content", content)?;
        require_non_empty("language", language)?;

        if lifetime.is_some_and(|lifetime| lifetime <= Duration::zero()) {
            return Err(AppError::InvalidArgument(
                "lifetime must be positive".to_string(),
            ));
        }

        let created_at = Utc::now();
        let expire_at = match lifetime {
            Some(lifetime) => Some(created_at.checked_add_signed(lifetime).ok_or_else(|| {
                AppError::InvalidExpiryFormat(format!("{}s", lifetime.num_seconds()))
            })?),
            None => None,
        };

        for attempt in 1..=self.max_attempts {
            let paste = Paste::new(
                generate_id(self.id_length),
                content.to_string(),
                language.to_string(),
                created_at,
                expire_at,
            );
            match self.store.create(&paste) {
                Ok(()) => {
                    tracing::info!(paste_id = %paste.id, "Created paste");
                    return Ok(paste);
                }
                Err(StoreError::UniqueViolation { id }) => {
                    tracing::warn!(attempt, "ID collision detected, retrying: {}", id);
                }
                Err(err) => return Err(store_failure("create", &paste.id, err)),
            }
        }

        Err(AppError::IdGenerationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Fetch a live paste.
    ///
    /// # Errors
    /// - [`AppError::NotFound`] when no row exists.
    /// - [`AppError::Expired`] when the row exists but its expiry has passed.
    pub fn get(&self, id: &str) -> Result<Paste, AppError> {
        self.fetch_live(id, Utc::now())
    }

    /// Fetch only the content of a live paste.
    ///
    /// Applies exactly the same expiry rules as [`PasteService::get`].
    ///
    /// # Errors
    /// See [`PasteService::get`].
    pub fn get_content(&self, id: &str) -> Result<String, AppError> {
        self.fetch_live(id, Utc::now()).map(|paste| paste.content)
    }

    fn fetch_live(&self, id: &str, now: DateTime<Utc>) -> Result<Paste, AppError> {
        if !is_well_formed_id(id) {
            return Err(AppError::NotFound);
        }
        let paste = self
            .store
            .get(id)
            .map_err(|err| store_failure("get", id, err))?
            .ok_or(AppError::NotFound)?;
        if paste.is_expired_at(now) {
            return Err(AppError::Expired);
        }
        Ok(paste)
    }

    /// Replace content and language of a paste.
    ///
    /// An empty or missing `language` falls back to `"text"`. Expiry is not
    /// re-checked: writing to an expired row succeeds but the paste stays
    /// invisible to reads. `created_at` and `expire_at` never change.
    ///
    /// # Returns
    /// The stored paste after the update.
    ///
    /// # Errors
    /// - [`AppError::InvalidArgument`] for empty content.
    /// - [`AppError::NotFound`] when no row exists.
    pub fn update(
        &self,
        id: &str,
        content: &str,
        language: Option<&str>,
    ) -> Result<Paste, AppError> {
        require_non_empty("content", content)?;
        if !is_well_formed_id(id) {
            return Err(AppError::NotFound);
        }
        let language = language
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        self.store
            .update(id, content, language)
            .map_err(|err| store_failure("update", id, err))
    }

    /// Add `delta` views to a paste atomically at the storage layer.
    ///
    /// # Returns
    /// The stored paste after the increment.
    ///
    /// # Errors
    /// [`AppError::NotFound`] when no row exists, otherwise store failures.
    pub fn increment_views(&self, id: &str, delta: u64) -> Result<Paste, AppError> {
        if !is_well_formed_id(id) {
            return Err(AppError::NotFound);
        }
        self.store
            .increment_views(id, delta)
            .map_err(|err| store_failure("increment_views", id, err))
    }

    /// Physically remove every paste whose expiry has passed.
    ///
    /// Safe to call repeatedly; a call with nothing expired removes nothing.
    ///
    /// # Returns
    /// Number of pastes removed.
    pub fn delete_expired(&self) -> Result<usize, AppError> {
        let removed = self
            .store
            .delete_expired(Utc::now())
            .map_err(|err| store_failure("delete_expired", "*", err))?;
        if removed > 0 {
            tracing::info!("Removed {} expired paste(s)", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests;
