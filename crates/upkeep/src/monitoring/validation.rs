//! Validation of user supplied endpoints and poll intervals.
//!
//! Identifiers end up as an argument of the system `ping` binary, so
//! anything that could be read as an option or split into several
//! arguments is refused here.

use std::time::Duration;

use thiserror::Error;

use super::types::Endpoint;

/// Smallest accepted poll interval in seconds
pub const MIN_INTERVAL_SECONDS: u64 = 1;
/// Largest accepted poll interval in seconds
pub const MAX_INTERVAL_SECONDS: u64 = 3600;

/// Why an endpoint identifier was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEndpoint {
    #[error("endpoint identifier is empty")]
    Empty,
    #[error("endpoint `{0}` is already monitored")]
    Duplicate(String),
    #[error("endpoint `{0}` contains whitespace")]
    Whitespace(String),
    #[error("endpoint `{0}` must not start with '-'")]
    LeadingDash(String),
}

/// Trim and check a raw identifier
pub fn validate_endpoint(raw: &str) -> Result<Endpoint, InvalidEndpoint> {
    let id = raw.trim();

    if id.is_empty() {
        return Err(InvalidEndpoint::Empty);
    }

    if id.chars().any(char::is_whitespace) {
        return Err(InvalidEndpoint::Whitespace(id.to_string()));
    }

    if id.starts_with('-') {
        return Err(InvalidEndpoint::LeadingDash(id.to_string()));
    }

    Ok(Endpoint::new_unchecked(id.to_string()))
}

/// Check a poll interval is within bounds
pub fn validate_interval(interval_seconds: u64) -> Result<Duration, IntervalOutOfRange> {
    if !(MIN_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS).contains(&interval_seconds) {
        return Err(IntervalOutOfRange(interval_seconds));
    }
    Ok(Duration::from_secs(interval_seconds))
}

/// Clamp a poll interval into bounds, used when loading untrusted files
pub fn clamp_interval(interval_seconds: u64) -> u64 {
    interval_seconds.clamp(MIN_INTERVAL_SECONDS, MAX_INTERVAL_SECONDS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "poll interval {0}s out of range (minimum: {min}s, maximum: {max}s)",
    min = MIN_INTERVAL_SECONDS,
    max = MAX_INTERVAL_SECONDS
)]
pub struct IntervalOutOfRange(pub u64);
