//! Fixtures for tests across the workspace.
//!
//! [`crate::PasteService`] only creates pastes with a future expiry, so
//! tests that exercise expired reads and sweeps seed rows through the store.

use crate::constants::PASTE_ID_LENGTH;
use crate::db::PasteStore;
use crate::ids::generate_id;
use crate::models::paste::Paste;
use chrono::{Duration, Utc};

/// Insert a paste whose expiry passed `expired_for` ago.
///
/// # Panics
/// Panics if the store rejects the row.
pub fn insert_expired<S: PasteStore + ?Sized>(
    store: &S,
    content: &str,
    expired_for: Duration,
) -> Paste {
    let now = Utc::now();
    let paste = Paste::new(
        generate_id(PASTE_ID_LENGTH),
        content.to_string(),
        "text".to_string(),
        now - expired_for - Duration::seconds(1),
        Some(now - expired_for),
    );
    store.create(&paste).expect("seed expired paste");
    paste
}
