//! Deferred expiration scheduling trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::result::AppResult;

/// Trait for scheduling deferred reservation expirations.
///
/// The backing queue must be durable (survive process restart) and deliver
/// at least once; the expiration worker re-checks reservation status before
/// mutating anything, so duplicate or late deliveries are harmless.
#[async_trait]
pub trait ExpirationScheduler: Send + Sync + std::fmt::Debug + 'static {
    /// Enqueue a deferred expiration for `reservation_id`, due at `due_at`.
    ///
    /// The work item is keyed by the reservation id; scheduling the same
    /// reservation twice while a job is still live is a no-op.
    async fn schedule(&self, reservation_id: Uuid, due_at: DateTime<Utc>) -> AppResult<()>;

    /// Best-effort removal of a still-pending expiration job.
    ///
    /// Returns `true` if a job was cancelled. Callers tolerate failure; a
    /// job that fires anyway no-ops on its own status re-check.
    async fn cancel(&self, reservation_id: Uuid) -> AppResult<bool>;
}
