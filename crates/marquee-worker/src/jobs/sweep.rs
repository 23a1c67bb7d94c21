//! Batch expiration sweep handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use marquee_core::error::AppError;
use marquee_entity::job::Job;
use marquee_service::ReservationService;

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `expiration_sweep` jobs enqueued by the cron scheduler.
///
/// The sweep is the self-healing backstop: whatever the per-reservation
/// jobs missed or duplicated, a sweep pass reconciles.
#[derive(Debug)]
pub struct SweepJobHandler {
    /// Reservation lifecycle manager.
    service: Arc<ReservationService>,
}

impl SweepJobHandler {
    /// Create a new sweep handler.
    pub fn new(service: Arc<ReservationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobHandler for SweepJobHandler {
    fn job_type(&self) -> &str {
        "expiration_sweep"
    }

    async fn execute(&self, _job: &Job) -> Result<(), JobExecutionError> {
        let count = self.service.sweep_expired().await.map_err(|e| match e {
            AppError::Infrastructure { .. } => JobExecutionError::Transient(e.to_string()),
            other => JobExecutionError::Permanent(other.to_string()),
        })?;

        if count > 0 {
            tracing::info!(count, "Sweep expired overdue reservations");
        }
        Ok(())
    }
}
