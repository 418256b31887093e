/// Shared helpers used across the codebase

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Current UTC time as an RFC 3339 string with millisecond precision.
/// Stored timestamps compare correctly as text in this form.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
