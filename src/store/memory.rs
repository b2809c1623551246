//! Volatile in-process cache store.

use async_trait::async_trait;
use chrono::Utc;
use moka::ops::compute::Op;
use moka::sync::Cache;
use tracing::debug;

use super::{CacheStore, Order, rank};
use crate::types::{CacheEntry, SaveRequest};
use crate::{HuginnError, Result};

/// In-memory [`CacheStore`] backed by moka.
///
/// Unbounded and without TTL: entries only disappear through
/// [`clear`](CacheStore::clear), expiry is a read-side decision of the
/// coordinator. Upserts and access counting go through moka's entry API,
/// which serializes closures per key, so a concurrent `save` and
/// `record_access` on one key never lose each other's update.
pub struct MemoryStore {
    entries: Cache<String, CacheEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().name("huginn-memory-store").build(),
        }
    }

    fn snapshot(&self) -> Vec<CacheEntry> {
        self.entries.iter().map(|(_, entry)| entry).collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lookup(&self, key: &str) -> Result<CacheEntry> {
        self.entries.get(key).ok_or(HuginnError::NotFound)
    }

    async fn save(&self, request: SaveRequest) -> Result<()> {
        let SaveRequest {
            key,
            payload,
            status_code,
        } = request;
        self.entries
            .entry_by_ref(key.as_str())
            .and_upsert_with(|existing| {
                let refreshed_at = Utc::now();
                match existing {
                    Some(existing) => CacheEntry {
                        payload,
                        status_code,
                        refreshed_at,
                        ..existing.into_value()
                    },
                    None => CacheEntry {
                        key: key.clone(),
                        payload,
                        status_code,
                        refreshed_at,
                        last_accessed_at: None,
                        access_count: 0,
                    },
                }
            });
        Ok(())
    }

    async fn record_access(&self, key: &str) -> Result<()> {
        self.entries.entry_by_ref(key).and_compute_with(|existing| {
            let Some(existing) = existing else {
                debug!(key, "access recorded for a key that is not cached");
                return Op::Nop;
            };
            let mut entry = existing.into_value();
            entry.access_count += 1;
            entry.last_accessed_at = Some(Utc::now());
            Op::Put(entry)
        });
        Ok(())
    }

    async fn top_n(&self, n: usize) -> Result<Vec<CacheEntry>> {
        Ok(rank(self.snapshot(), n, Order::MostPopular))
    }

    async fn bottom_n(&self, n: usize) -> Result<Vec<CacheEntry>> {
        Ok(rank(self.snapshot(), n, Order::LeastPopular))
    }

    async fn all(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.snapshot())
    }

    async fn clear(&self) -> Result<()> {
        // Everything inserted before this call becomes invisible at once;
        // moka reclaims the memory lazily.
        self.entries.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.lookup("?missing").await.unwrap_err();
        assert!(matches!(err, HuginnError::NotFound));
    }

    #[tokio::test]
    async fn save_creates_with_zero_count() {
        let store = MemoryStore::new();
        store
            .save(SaveRequest::new("?q", b"payload".to_vec(), 200))
            .await
            .unwrap();
        let entry = store.lookup("?q").await.unwrap();
        assert_eq!(entry.key, "?q");
        assert_eq!(entry.payload, b"payload");
        assert_eq!(entry.access_count, 0);
    }

    #[tokio::test]
    async fn record_access_on_missing_key_is_noop() {
        let store = MemoryStore::new();
        store.record_access("?ghost").await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
    }
}
