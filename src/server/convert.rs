//! Wire types shared by the admin routes and the admin client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CacheEntry;

/// JSON rendering of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    pub key: String,
    /// Payload decoded as UTF-8, invalid sequences replaced.
    pub payload: String,
    pub status_code: u16,
    pub refreshed_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub access_count: u64,
}

impl From<CacheEntry> for EntryView {
    fn from(entry: CacheEntry) -> Self {
        Self {
            payload: String::from_utf8_lossy(&entry.payload).into_owned(),
            key: entry.key,
            status_code: entry.status_code,
            refreshed_at: entry.refreshed_at,
            last_accessed_at: entry.last_accessed_at,
            access_count: entry.access_count,
        }
    }
}

/// `GET /admin/health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthView {
    pub status: HealthStatus,
    pub version: String,
    pub storage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Error body of the admin routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorView {
    pub error: String,
}
