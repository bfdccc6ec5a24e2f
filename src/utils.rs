//! Utility functions for the match tracker

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique submission ID
pub fn generate_submission_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Split a `"A vs B"` label into its two names, keeping their order
pub fn split_pairing_label(label: &str) -> Option<(&str, &str)> {
    let (home, away) = label
        .split_once(crate::types::PAIRING_SEPARATOR)
        .or_else(|| label.split_once("vs"))?;
    let (home, away) = (home.trim(), away.trim());
    (!home.is_empty() && !away.is_empty()).then_some((home, away))
}
