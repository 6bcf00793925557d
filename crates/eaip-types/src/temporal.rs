use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hybrid logical timestamp attached to every snapshot.
///
/// Wall-clock milliseconds plus a logical counter. Within one document's
/// chain each snapshot's timestamp is strictly greater than its
/// predecessor's, even if the wall clock stalls or steps backwards.
///
/// Ordering: `physical_ms` → `logical`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub physical_ms: u64,
    /// Counter for snapshots created within the same millisecond.
    pub logical: u32,
}

impl Timestamp {
    pub const fn new(physical_ms: u64, logical: u32) -> Self {
        Self {
            physical_ms,
            logical,
        }
    }

    /// Timestamp for the current wall-clock time.
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis().max(0) as u64)
    }

    pub const fn from_millis(physical_ms: u64) -> Self {
        Self::new(physical_ms, 0)
    }

    /// The next timestamp for a chain whose newest entry carries `last`.
    pub fn successor_of(last: Option<&Timestamp>) -> Self {
        Self::now().after(last)
    }

    /// Clamp `self` so that it is strictly after `last`.
    pub fn after(self, last: Option<&Timestamp>) -> Self {
        match last {
            None => self,
            Some(prev) if self.physical_ms > prev.physical_ms => Self::from_millis(self.physical_ms),
            Some(prev) => Self::new(prev.physical_ms, prev.logical.saturating_add(1)),
        }
    }

    /// Wall-clock view, for display and API payloads.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        i64::try_from(self.physical_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_default()
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms.{})", self.physical_ms, self.logical)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.physical_ms, self.logical)
    }
}
