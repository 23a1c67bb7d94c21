//! In-memory multi-key lock coordinator.
//!
//! Mirrors the semantics of the Redis Lua scripts: the whole acquire or
//! release call happens inside one mutex critical section, so nothing can
//! interleave mid-batch. Held entries carry deadlines, so a crashed holder
//! stops blocking others once its TTL lapses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use marquee_core::result::AppResult;
use marquee_core::traits::lock::{AcquireOutcome, LockCoordinator};

/// A single held lock entry.
#[derive(Debug, Clone)]
struct Hold {
    token: String,
    expires_at: Instant,
}

impl Hold {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory lock coordinator for single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryLockCoordinator {
    entries: Mutex<HashMap<String, Hold>>,
}

impl MemoryLockCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently held by a live token.
    pub async fn is_held(&self, key: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .map(|hold| !hold.is_expired(Instant::now()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl LockCoordinator for MemoryLockCoordinator {
    async fn acquire_all(
        &self,
        keys: &[String],
        token: &str,
        ttl: Duration,
    ) -> AppResult<AcquireOutcome> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        for (index, key) in keys.iter().enumerate() {
            let blocked = entries
                .get(key)
                .map(|hold| !hold.is_expired(now))
                .unwrap_or(false);

            if blocked {
                // Roll back every key set earlier in this call.
                for prior in &keys[..index] {
                    if let Some(hold) = entries.get(prior) {
                        if hold.token == token {
                            entries.remove(prior);
                        }
                    }
                }
                debug!(%key, "Lock acquisition blocked");
                return Ok(AcquireOutcome::Blocked { key: key.clone() });
            }

            entries.insert(
                key.clone(),
                Hold {
                    token: token.to_string(),
                    expires_at: now + ttl,
                },
            );
        }

        debug!(count = keys.len(), "Acquired all lock keys");
        Ok(AcquireOutcome::Acquired)
    }

    async fn release_all(&self, keys: &[String], token: &str) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let mut released = 0;
        for key in keys {
            if let Some(hold) = entries.get(key) {
                if hold.token == token {
                    entries.remove(key);
                    released += 1;
                }
            }
        }
        Ok(released)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_acquire_all_succeeds_on_free_keys() {
        let lock = MemoryLockCoordinator::new();
        let outcome = lock
            .acquire_all(&keys(&["a", "b", "c"]), "t1", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(outcome, AcquireOutcome::Acquired);
        assert!(lock.is_held("a").await);
        assert!(lock.is_held("c").await);
    }

    #[tokio::test]
    async fn test_blocked_acquire_rolls_back_earlier_keys() {
        let lock = MemoryLockCoordinator::new();
        lock.acquire_all(&keys(&["b"]), "other", Duration::from_secs(10))
            .await
            .unwrap();

        let outcome = lock
            .acquire_all(&keys(&["a", "b", "c"]), "t1", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AcquireOutcome::Blocked {
                key: "b".to_string()
            }
        );
        // "a" was set before the refusal and must have been rolled back.
        assert!(!lock.is_held("a").await);
        assert!(!lock.is_held("c").await);
        assert!(lock.is_held("b").await);
    }

    #[tokio::test]
    async fn test_release_only_removes_own_token() {
        let lock = MemoryLockCoordinator::new();
        lock.acquire_all(&keys(&["a"]), "t1", Duration::from_secs(10))
            .await
            .unwrap();
        lock.acquire_all(&keys(&["b"]), "t2", Duration::from_secs(10))
            .await
            .unwrap();

        let released = lock.release_all(&keys(&["a", "b"]), "t1").await.unwrap();
        assert_eq!(released, 1);
        assert!(!lock.is_held("a").await);
        assert!(lock.is_held("b").await);
    }

    #[tokio::test]
    async fn test_expired_hold_no_longer_blocks() {
        let lock = MemoryLockCoordinator::new();
        lock.acquire_all(&keys(&["a"]), "t1", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let outcome = lock
            .acquire_all(&keys(&["a"]), "t2", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(outcome, AcquireOutcome::Acquired);
    }

    #[tokio::test]
    async fn test_acquiring_empty_key_set_is_trivially_acquired() {
        let lock = MemoryLockCoordinator::new();
        let outcome = lock
            .acquire_all(&[], "t1", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(outcome, AcquireOutcome::Acquired);
    }
}
