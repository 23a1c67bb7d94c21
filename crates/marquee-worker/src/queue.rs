//! Durable expiration queue over the job store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use marquee_core::result::AppResult;
use marquee_core::traits::scheduler::ExpirationScheduler;
use marquee_database::repositories::JobStore;
use marquee_entity::job::{JobPayload, NewJob};

/// Queue name for expiration work.
pub const EXPIRATION_QUEUE: &str = "expiration";

/// Job key for the singleton sweep job.
const SWEEP_JOB_KEY: &str = "expiration_sweep";

/// Durable, delay-capable queue for reservation expirations.
///
/// Jobs are keyed by reservation id, so scheduling is idempotent while a
/// job is live and cancellation can address the job without knowing its id.
#[derive(Debug, Clone)]
pub struct ExpirationQueue {
    /// Job persistence.
    store: Arc<dyn JobStore>,
    /// Attempt cap applied to every enqueued job.
    max_attempts: i32,
}

impl ExpirationQueue {
    /// Create a new expiration queue.
    pub fn new(store: Arc<dyn JobStore>, max_attempts: i32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    /// Enqueue a sweep of all overdue pending reservations.
    ///
    /// The fixed job key keeps at most one sweep live at a time, so an
    /// aggressive cron cadence cannot pile up sweeps behind a slow worker.
    pub async fn enqueue_sweep(&self) -> AppResult<()> {
        let payload = JobPayload::ExpirationSweep;
        let created = self
            .store
            .insert(&NewJob {
                job_type: payload.job_type().to_string(),
                job_key: SWEEP_JOB_KEY.to_string(),
                queue: EXPIRATION_QUEUE.to_string(),
                payload: payload.to_value()?,
                max_attempts: 1,
                scheduled_at: None,
            })
            .await?;

        match created {
            Some(job) => debug!(job = %job.id, "Enqueued expiration sweep"),
            None => debug!("Sweep already enqueued, skipping"),
        }
        Ok(())
    }
}

#[async_trait]
impl ExpirationScheduler for ExpirationQueue {
    async fn schedule(&self, reservation_id: Uuid, due_at: DateTime<Utc>) -> AppResult<()> {
        let payload = JobPayload::ReservationExpiration { reservation_id };
        let created = self
            .store
            .insert(&NewJob {
                job_type: payload.job_type().to_string(),
                job_key: reservation_id.to_string(),
                queue: EXPIRATION_QUEUE.to_string(),
                payload: payload.to_value()?,
                max_attempts: self.max_attempts,
                scheduled_at: Some(due_at),
            })
            .await?;

        match created {
            Some(job) => debug!(
                job = %job.id,
                reservation = %reservation_id,
                due_at = %due_at,
                "Scheduled expiration job"
            ),
            None => debug!(
                reservation = %reservation_id,
                "Expiration already scheduled, skipping"
            ),
        }
        Ok(())
    }

    async fn cancel(&self, reservation_id: Uuid) -> AppResult<bool> {
        let cancelled = self
            .store
            .cancel_pending_by_key(&reservation_id.to_string())
            .await?;
        if cancelled {
            debug!(reservation = %reservation_id, "Cancelled expiration job");
        }
        Ok(cancelled)
    }
}
