//! In-memory cache implementation using dashmap.
//!
//! Entries carry explicit deadlines checked on read, which keeps set_nx a
//! single atomic entry operation (the semantics the lock-adjacent callers
//! rely on).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;

use marquee_core::result::AppResult;
use marquee_core::traits::cache::CacheProvider;

/// A cached value and its deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory cache provider.
#[derive(Debug, Default)]
pub struct MemoryCacheProvider {
    entries: DashMap<String, Entry>,
}

impl MemoryCacheProvider {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Lazily evict on read.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(Entry {
                        value: value.to_string(),
                        expires_at: now + ttl,
                    });
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    value: value.to_string(),
                    expires_at: now + ttl,
                });
                Ok(true)
            }
        }
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<u64>> {
        let now = Instant::now();
        Ok(self.entries.get(key).and_then(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.expires_at.duration_since(now).as_secs())
            }
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = MemoryCacheProvider::new();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert!(cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_missing() {
        let cache = MemoryCacheProvider::new();
        cache
            .set("k", "v", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_nx_refuses_live_key() {
        let cache = MemoryCacheProvider::new();
        assert!(cache.set_nx("k", "a", Duration::from_secs(10)).await.unwrap());
        assert!(!cache.set_nx("k", "b", Duration::from_secs(10)).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_ttl_reports_remaining_time() {
        let cache = MemoryCacheProvider::new();
        cache.set("k", "v", Duration::from_secs(30)).await.unwrap();
        let remaining = cache.ttl("k").await.unwrap().expect("ttl present");
        assert!(remaining <= 30);
        assert!(cache.ttl("missing").await.unwrap().is_none());
    }
}
