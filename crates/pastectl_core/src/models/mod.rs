//! Data models for API requests and persistence.

/// Paste row and request payloads.
pub mod paste;
