//! Textual timestamp encoding used by the conversation database
//!
//! SQLite fills every timestamp column itself with
//! `strftime('%Y-%m-%dT%H:%M:%SZ','now')`, so values on disk are UTC with
//! second precision. Reads go through [`parse_timestamp`].

use crate::error::{ChattyError, Result};
use chrono::{DateTime, Utc};

/// `strftime` layout of every persisted timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Decode a stored timestamp
///
/// A blank value decodes to the zero timestamp (`DateTime::<Utc>::default()`,
/// the Unix epoch). Any other value must be RFC 3339; anything else is
/// reported as [`ChattyError::ParseFailure`] rather than replaced.
///
/// # Examples
///
/// ```
/// use chatty::storage::parse_timestamp;
///
/// let ts = parse_timestamp("2024-05-01T12:30:00Z").unwrap();
/// assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
/// assert!(parse_timestamp("not a time").is_err());
/// ```
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(DateTime::<Utc>::default());
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ChattyError::ParseFailure {
                value: value.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Render a timestamp in the storage encoding
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}
