//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use marquee_core::config::cache::CacheConfig;
use marquee_core::error::{AppError, Subsystem};
use marquee_core::result::AppResult;
use marquee_core::traits::cache::CacheProvider;
use marquee_core::traits::lock::LockCoordinator;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new())
            }
            other => {
                return Err(AppError::infrastructure(
                    Subsystem::Cache,
                    format!("Unknown cache provider: '{other}'. Supported: memory, redis"),
                ));
            }
        };

        Ok(Self { inner })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// Get a shared handle to the inner provider.
    pub fn provider(&self) -> Arc<dyn CacheProvider> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx(key, value, ttl).await
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<u64>> {
        self.inner.ttl(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

/// Build the lock coordinator matching the configured backend.
///
/// Locks and cache entries share one coordination store, so the same
/// provider string drives both.
pub async fn lock_coordinator(config: &CacheConfig) -> AppResult<Arc<dyn LockCoordinator>> {
    match config.provider.as_str() {
        "redis" => {
            info!("Initializing Redis lock coordinator");
            let client = crate::redis::RedisClient::connect(&config.redis).await?;
            Ok(Arc::new(crate::redis::RedisLockCoordinator::new(client)))
        }
        "memory" => {
            info!("Initializing in-memory lock coordinator");
            Ok(Arc::new(crate::memory::MemoryLockCoordinator::new()))
        }
        other => Err(AppError::infrastructure(
            Subsystem::Lock,
            format!("Unknown lock provider: '{other}'. Supported: memory, redis"),
        )),
    }
}
