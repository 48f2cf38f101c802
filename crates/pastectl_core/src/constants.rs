//! Shared constants used across pastectl crates.

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default maximum paste size accepted by the API layer.
pub const DEFAULT_MAX_PASTE_SIZE: usize = 10 * 1024 * 1024;

/// Default period between expiry sweeps (2 hours).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 2 * 60 * 60;

/// Length of generated paste identifiers.
pub const PASTE_ID_LENGTH: usize = 5;

/// Create attempts before giving up on id collisions.
pub const MAX_ID_ATTEMPTS: usize = 5;

/// Language tag applied when an update omits one.
pub const DEFAULT_LANGUAGE: &str = "text";
