use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health check payloads.
pub mod health;
/// Match and roster payloads.
pub mod matches;
/// Team draw payloads.
pub mod teams;
/// Custom validators.
pub mod validation;

/// RFC 3339 rendering of a stored timestamp, in UTC.
fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
