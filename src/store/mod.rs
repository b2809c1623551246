//! Cache storage contract and its backends.
//!
//! - [`MemoryStore`]: volatile in-process store (moka). Always ready.
//! - [`PostgresStore`]: durable table-backed store with its own
//!   connection-liveness loop (requires the `postgres` feature).
//!
//! Both backends satisfy [`CacheStore`] identically: a caller cannot tell
//! them apart except through [`HuginnError::StorageUnavailable`], which
//! only the durable backend ever reports.
//!
//! # Exclusion domain
//!
//! `save` must keep the popularity counters that `record_access` bumps, so
//! the two operations are serialized per key: the memory store runs both
//! inside moka's per-key entry lock, the durable store expresses each as a
//! single SQL statement against the primary key.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresStore};

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::Result;
use crate::types::{CacheEntry, SaveRequest};

/// Storage contract every cache backend implements.
///
/// All methods must be safe under unbounded concurrent callers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logs and settings output.
    fn name(&self) -> &str;

    /// Fetch the entry for `key`.
    ///
    /// Returns [`HuginnError::NotFound`](crate::HuginnError::NotFound) on a
    /// miss and [`HuginnError::StorageUnavailable`](crate::HuginnError::StorageUnavailable)
    /// when the backend is not ready.
    async fn lookup(&self, key: &str) -> Result<CacheEntry>;

    /// Upsert a payload, keeping `access_count`/`last_accessed_at` of an
    /// existing entry. New entries start with `access_count = 0`.
    async fn save(&self, request: SaveRequest) -> Result<()>;

    /// Count one logical access: `access_count += 1`,
    /// `last_accessed_at = now`. A missing key is a no-op.
    async fn record_access(&self, key: &str) -> Result<()>;

    /// Most popular entries first; ties go to the most recently accessed.
    async fn top_n(&self, n: usize) -> Result<Vec<CacheEntry>>;

    /// Least popular entries first; ties go to the least recently accessed.
    async fn bottom_n(&self, n: usize) -> Result<Vec<CacheEntry>>;

    /// Every entry, in no particular order.
    async fn all(&self) -> Result<Vec<CacheEntry>>;

    /// Remove every entry. Readers never observe a partially cleared store.
    async fn clear(&self) -> Result<()>;

    /// `Err(StorageUnavailable)` while the backend cannot serve requests.
    async fn ready(&self) -> Result<()> {
        Ok(())
    }
}

/// Ranking direction for [`rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `access_count` descending, then `last_accessed_at` descending.
    MostPopular,
    /// `access_count` ascending, then `last_accessed_at` ascending.
    LeastPopular,
}

/// Sort `entries` by popularity and keep the first `n`.
///
/// Never-accessed entries (`last_accessed_at == None`) sort before any
/// timestamp in ascending order and after any timestamp in descending order.
pub fn rank(mut entries: Vec<CacheEntry>, n: usize, order: Order) -> Vec<CacheEntry> {
    entries.sort_by(|a, b| compare(a, b, order));
    entries.truncate(n);
    entries
}

fn compare(a: &CacheEntry, b: &CacheEntry, order: Order) -> Ordering {
    let ascending = a
        .access_count
        .cmp(&b.access_count)
        .then_with(|| a.last_accessed_at.cmp(&b.last_accessed_at))
        // Keys keep the output deterministic when both statistics tie.
        .then_with(|| a.key.cmp(&b.key));
    match order {
        Order::LeastPopular => ascending,
        Order::MostPopular => ascending.reverse(),
    }
}
