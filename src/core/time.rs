//! Timestamp and id helpers for audit events and asset records.

use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", now_epoch_secs())
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}
