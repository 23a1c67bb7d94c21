//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use marquee_core::config::worker::WorkerConfig;
use marquee_core::error::{AppError, Subsystem};

use crate::queue::ExpirationQueue;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Queue for enqueuing scheduled work.
    queue: Arc<ExpirationQueue>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(queue: Arc<ExpirationQueue>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new().await.map_err(|e| {
            AppError::infrastructure(Subsystem::Queue, format!("Failed to create scheduler: {e}"))
        })?;

        Ok(Self { scheduler, queue })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register_expiration_sweep(config.sweep_interval_seconds)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler.start().await.map_err(|e| {
            AppError::infrastructure(Subsystem::Queue, format!("Failed to start scheduler: {e}"))
        })?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler.shutdown().await.map_err(|e| {
            AppError::infrastructure(Subsystem::Queue, format!("Failed to shutdown scheduler: {e}"))
        })?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Expiration sweep — the backstop for missed or duplicated jobs.
    async fn register_expiration_sweep(&self, interval_seconds: u64) -> Result<(), AppError> {
        let interval = interval_seconds.clamp(1, 59);
        let schedule = format!("*/{interval} * * * * *");

        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async(schedule.as_str(), move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                tracing::debug!("Scheduling expiration sweep job");
                if let Err(e) = queue.enqueue_sweep().await {
                    tracing::error!("Failed to enqueue expiration sweep: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::infrastructure(
                Subsystem::Queue,
                format!("Failed to create expiration_sweep schedule: {e}"),
            )
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::infrastructure(
                Subsystem::Queue,
                format!("Failed to add expiration_sweep schedule: {e}"),
            )
        })?;

        tracing::info!("Registered: expiration_sweep (every {interval}s)");
        Ok(())
    }
}
