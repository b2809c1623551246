//! Cached entry and its popularity statistics

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached upstream response plus the statistics used for ranking.
///
/// `key` is the normalized query string and is the only identity an entry
/// has. Writes (`save`) touch `payload`, `status_code` and `refreshed_at`;
/// logical accesses (`record_access`) touch `access_count` and
/// `last_accessed_at`. Neither kind of update clobbers the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub status_code: u16,
    pub refreshed_at: DateTime<Utc>,
    /// `None` until the entry is first accessed.
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access_count: u64,
}

impl CacheEntry {
    /// A never-accessed entry refreshed now.
    pub fn new(key: impl Into<String>, payload: impl Into<Vec<u8>>, status_code: u16) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
            status_code,
            refreshed_at: Utc::now(),
            last_accessed_at: None,
            access_count: 0,
        }
    }

    /// Time elapsed since the last successful write, measured at `now`.
    ///
    /// Entries stamped in the future (clock skew between writers) count as
    /// zero age.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.refreshed_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is still within `expiry_period` at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, expiry_period: Duration) -> bool {
        self.age_at(now) <= expiry_period
    }

    /// Whether the entry is still within `expiry_period` right now.
    pub fn is_fresh(&self, expiry_period: Duration) -> bool {
        self.is_fresh_at(Utc::now(), expiry_period)
    }
}

/// Payload write for [`CacheStore::save`](crate::store::CacheStore::save).
///
/// Carries only the fields a write is allowed to change; the store stamps
/// `refreshed_at` itself and keeps the popularity counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub key: String,
    pub payload: Vec<u8>,
    pub status_code: u16,
}

impl SaveRequest {
    pub fn new(key: impl Into<String>, payload: impl Into<Vec<u8>>, status_code: u16) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
            status_code,
        }
    }
}
