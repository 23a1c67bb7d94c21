//! Distributed multi-key lock coordinator trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Outcome of a multi-key acquisition attempt.
///
/// A blocked acquisition is a normal contention outcome, not an error;
/// an unreachable lock service surfaces as `AppError::Infrastructure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Every requested key is now held by the caller's token.
    Acquired,
    /// Acquisition failed; no key from this call is held.
    Blocked {
        /// The first key that was already held by another token.
        key: String,
    },
}

impl AcquireOutcome {
    /// Whether every key was acquired.
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired)
    }
}

/// Trait for atomic multi-key mutual exclusion.
///
/// Callers must pass `keys` sorted and deduplicated: every caller attempting
/// acquisition in the same global order is what makes a circular wait
/// impossible among overlapping multi-key requests.
///
/// Implementations must execute each call as a single atomic unit against
/// the backend — no other acquire or release may interleave mid-batch. Two
/// implementations are provided:
/// - Redis-based (Lua scripts for atomicity)
/// - In-memory (a single `tokio::sync::Mutex` critical section)
#[async_trait]
pub trait LockCoordinator: Send + Sync + std::fmt::Debug + 'static {
    /// Attempt to acquire every key for `token`, all-or-nothing.
    ///
    /// Keys are tried in the given order with a conditional
    /// set-if-absent-with-expiry; on the first refusal every key set
    /// earlier in this call is rolled back (only if still owned by
    /// `token`) and the blocking key is reported.
    async fn acquire_all(
        &self,
        keys: &[String],
        token: &str,
        ttl: Duration,
    ) -> AppResult<AcquireOutcome>;

    /// Release every key currently owned by `token`.
    ///
    /// Each key is deleted only if its value still equals `token`; keys
    /// re-acquired by someone else after this token's TTL lapsed are left
    /// untouched. Returns the number of keys actually released.
    async fn release_all(&self, keys: &[String], token: &str) -> AppResult<u64>;

    /// Check that the lock backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
