//! Paste-related data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paste row stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    pub id: String,
    pub content: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub views: u64,
}

/// Request payload for creating a paste.
///
/// Missing fields deserialize as empty strings so validation happens in one
/// place ([`crate::PasteService::create`]).
#[derive(Debug, Default, Deserialize)]
pub struct CreatePasteRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    /// Relative lifetime token: `1h`, `24h`, `7d`, `never`, ...
    #[serde(default)]
    pub expire: Option<String>,
}

/// Request payload for updating a paste.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct UpdatePasteRequest {
    #[serde(default)]
    pub content: String,
    pub language: Option<String>,
}

impl Paste {
    /// Create a fresh, never-viewed paste stamped with `created_at`.
    ///
    /// # Arguments
    /// - `id`: Identifier assigned by the lifecycle service.
    /// - `content`: Paste body.
    /// - `language`: Syntax tag.
    /// - `created_at`: Creation timestamp.
    /// - `expire_at`: Absolute expiry, or `None` for a paste that never expires.
    ///
    /// # Returns
    /// A new [`Paste`] with `views == 0`.
    pub fn new(
        id: String,
        content: String,
        language: String,
        created_at: DateTime<Utc>,
        expire_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            content,
            language,
            created_at,
            expire_at,
            views: 0,
        }
    }

    /// Whether the paste is logically gone at `now`.
    ///
    /// Every read path goes through this check; a row can be physically
    /// present long after it stopped being live.
    ///
    /// # Returns
    /// `true` when `expire_at` is set and lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|expire_at| now > expire_at)
    }
}
