//! Scheduled reservation expiration handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use marquee_core::error::AppError;
use marquee_entity::job::{Job, JobPayload};
use marquee_service::ReservationService;

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `reservation_expiration` jobs fired by the delayed queue.
///
/// All state checks live in the lifecycle manager: a reservation that was
/// confirmed, cancelled, already expired, or is not yet due makes the fire
/// a no-op, which is what makes at-least-once delivery safe.
#[derive(Debug)]
pub struct ExpirationJobHandler {
    /// Reservation lifecycle manager.
    service: Arc<ReservationService>,
}

impl ExpirationJobHandler {
    /// Create a new expiration handler.
    pub fn new(service: Arc<ReservationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobHandler for ExpirationJobHandler {
    fn job_type(&self) -> &str {
        "reservation_expiration"
    }

    async fn execute(&self, job: &Job) -> Result<(), JobExecutionError> {
        let payload = JobPayload::from_value(&job.payload)
            .map_err(|e| JobExecutionError::Permanent(e.to_string()))?;
        let JobPayload::ReservationExpiration { reservation_id } = payload else {
            return Err(JobExecutionError::Permanent(format!(
                "Wrong payload for expiration job: {}",
                job.payload
            )));
        };

        let expired = self
            .service
            .expire_if_due(reservation_id)
            .await
            .map_err(|e| match e {
                AppError::Infrastructure { .. } => JobExecutionError::Transient(e.to_string()),
                other => JobExecutionError::Permanent(other.to_string()),
            })?;

        if expired {
            tracing::info!(reservation = %reservation_id, "Expiration job reclaimed the hold");
        }
        Ok(())
    }
}
