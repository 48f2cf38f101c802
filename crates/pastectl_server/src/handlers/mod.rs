//! HTTP request handlers.

/// Live update WebSocket endpoint.
pub mod live;
/// Paste-related endpoints.
pub mod paste;
