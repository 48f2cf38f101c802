//! Core domain library for pastectl (paste lifecycle, storage, config).

/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Paste store contract and redb backend.
pub mod db;
#[cfg(test)]
mod env;
/// Error types (storage/domain).
pub mod error;
/// Expiry token resolution.
pub mod expiry;
/// Paste identifier generation.
pub mod ids;
/// Data models for API requests and persistence.
pub mod models;
/// Paste lifecycle service.
pub mod service;
/// Fixtures for tests that need pastes the public API refuses to create.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::Config;
pub use constants::DEFAULT_PORT;
pub use db::{PasteStore, RedbStore};
pub use error::{AppError, StoreError};
pub use service::PasteService;
