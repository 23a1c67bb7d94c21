//! Redis-based multi-key lock coordinator using Lua scripts for atomicity.
//!
//! Suitable for multi-process deployments: the whole acquire-or-rollback
//! sequence runs server-side as one script, so no other client's SET or DEL
//! can interleave mid-batch.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_core::traits::lock::{AcquireOutcome, LockCoordinator};

use super::client::RedisClient;

/// Lua script for all-or-nothing multi-key acquisition.
///
/// KEYS    = lock keys, in the caller's (sorted) order
/// ARGV[1] = lock token
/// ARGV[2] = ttl in seconds
///
/// Tries SET NX EX on each key in order. On the first refusal, every key
/// set earlier in this call is deleted again (only while it still holds
/// this token) and the blocking key is reported.
const ACQUIRE_ALL_SCRIPT: &str = r#"
    local token = ARGV[1]
    local ttl = tonumber(ARGV[2])

    for i, key in ipairs(KEYS) do
        local ok = redis.call('SET', key, token, 'EX', ttl, 'NX')
        if not ok then
            for j = 1, i - 1 do
                if redis.call('GET', KEYS[j]) == token then
                    redis.call('DEL', KEYS[j])
                end
            end
            return { 'BLOCKED', key }
        end
    end

    return { 'OK', token }
"#;

/// Lua script for token-checked multi-key release.
///
/// Deletes each key only while its value equals the token; keys re-acquired
/// by another caller after this token's TTL lapsed are left untouched.
/// Returns the number of keys released.
const RELEASE_ALL_SCRIPT: &str = r#"
    local token = ARGV[1]
    local released = 0

    for i, key in ipairs(KEYS) do
        if redis.call('GET', key) == token then
            redis.call('DEL', key)
            released = released + 1
        end
    end

    return released
"#;

/// Redis-based lock coordinator for multi-process deployments.
#[derive(Debug, Clone)]
pub struct RedisLockCoordinator {
    /// Shared Redis client.
    client: RedisClient,
}

impl RedisLockCoordinator {
    /// Create a new Redis lock coordinator.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LockCoordinator for RedisLockCoordinator {
    async fn acquire_all(
        &self,
        keys: &[String],
        token: &str,
        ttl: Duration,
    ) -> AppResult<AcquireOutcome> {
        if keys.is_empty() {
            return Ok(AcquireOutcome::Acquired);
        }

        let script = redis::Script::new(ACQUIRE_ALL_SCRIPT);
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(self.client.prefixed_key(key));
        }
        invocation.arg(token).arg(ttl.as_secs().max(1));

        let mut conn = self.client.conn_mut();
        let result: Vec<String> = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::lock("Multi-key acquire script failed", e))?;

        match result.first().map(String::as_str) {
            Some("OK") => {
                debug!(count = keys.len(), "Acquired all lock keys");
                Ok(AcquireOutcome::Acquired)
            }
            Some("BLOCKED") => {
                let raw = result.get(1).map(String::as_str).unwrap_or_default();
                let key = self.client.strip_prefix(raw).to_string();
                debug!(%key, "Lock acquisition blocked");
                Ok(AcquireOutcome::Blocked { key })
            }
            other => Err(AppError::infrastructure(
                marquee_core::error::Subsystem::Lock,
                format!("Unexpected acquire script result: {other:?}"),
            )),
        }
    }

    async fn release_all(&self, keys: &[String], token: &str) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let script = redis::Script::new(RELEASE_ALL_SCRIPT);
        let mut invocation = script.prepare_invoke();
        for key in keys {
            invocation.key(self.client.prefixed_key(key));
        }
        invocation.arg(token);

        let mut conn = self.client.conn_mut();
        let released: u64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::lock("Multi-key release script failed", e))?;

        if released < keys.len() as u64 {
            warn!(
                released,
                requested = keys.len(),
                "Some lock keys were no longer owned at release"
            );
        }
        Ok(released)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::lock("Redis ping failed", e))?;
        Ok(pong == "PONG")
    }
}
