//! Expiry token resolution.
//!
//! Tokens describe a relative lifetime and are resolved once, at creation
//! time, into an absolute `expire_at`. Accepted forms:
//!
//! - `""` or `never`: no expiry
//! - `<n><unit>` with a positive integer `n` and unit `m` (minutes),
//!   `h` (hours), `d` (days) or `w` (weeks); the common `1h`, `24h` and `7d`
//!   are special cases of this form

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};

/// Resolve an expiry token into a relative lifetime.
///
/// # Returns
/// `Ok(None)` for tokens meaning "never expires", otherwise a strictly
/// positive [`Duration`].
///
/// # Errors
/// Returns [`AppError::InvalidExpiryFormat`] for unrecognized tokens, zero
/// amounts, or durations that overflow.
pub fn resolve(token: &str) -> Result<Option<Duration>, AppError> {
    let token = token.trim();
    if token.is_empty() || token.eq_ignore_ascii_case("never") {
        return Ok(None);
    }

    let invalid = || AppError::InvalidExpiryFormat(token.to_string());
    let unit_at = token
        .char_indices()
        .last()
        .map(|(idx, _)| idx)
        .ok_or_else(invalid)?;
    let (amount, unit) = token.split_at(unit_at);
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let duration = match unit {
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_weeks(amount),
        _ => None,
    };
    duration.ok_or_else(invalid).map(Some)
}

/// Turn an optional token into an absolute expiry relative to `now`.
///
/// # Returns
/// `Ok(None)` when no token was given or it means "never".
///
/// # Errors
/// Returns [`AppError::InvalidExpiryFormat`] when the token is invalid or the
/// resulting timestamp is out of range.
pub fn expire_at_from_token(
    token: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };
    match resolve(token)? {
        Some(duration) => now
            .checked_add_signed(duration)
            .map(Some)
            .ok_or_else(|| AppError::InvalidExpiryFormat(token.to_string())),
        None => Ok(None),
    }
}
