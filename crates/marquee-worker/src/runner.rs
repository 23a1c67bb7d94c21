//! Worker runner — main loop that claims due jobs and executes them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::RngExt;
use tokio::sync::watch;
use tokio::time;
use tracing;

use marquee_core::config::worker::WorkerConfig;
use marquee_database::repositories::JobStore;
use marquee_entity::job::Job;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::queue::EXPIRATION_QUEUE;

/// Main worker runner that polls the job store and executes due jobs.
///
/// Execution concurrency is bounded by a semaphore sized from
/// [`WorkerConfig::concurrency`], capping load on the store no matter how
/// many jobs come due at once.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job persistence.
    store: Arc<dyn JobStore>,
    /// Job executor for dispatching.
    executor: Arc<JobExecutor>,
    /// Worker configuration.
    config: WorkerConfig,
    /// Worker identifier.
    worker_id: String,
    /// Queues to poll (in priority order).
    queues: Vec<String>,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        store: Arc<dyn JobStore>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            store,
            executor,
            config,
            worker_id,
            queues: vec![EXPIRATION_QUEUE.to_string()],
        }
    }

    /// Set the queues to poll.
    pub fn with_queues(mut self, queues: Vec<String>) -> Self {
        self.queues = queues;
        self
    }

    /// Start the worker runner — runs until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Worker '{}' started with concurrency={}, poll_interval={}s, queues={:?}",
            self.worker_id,
            self.config.concurrency,
            self.config.poll_interval_seconds,
            self.queues
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Worker '{}' received shutdown signal", self.worker_id);
                        break;
                    }
                }
                claimed = self.poll_and_execute(&semaphore) => {
                    // Poll again immediately while work keeps coming; only
                    // sleep once the queues run dry.
                    if !claimed {
                        tokio::select! {
                            _ = cancel.changed() => {
                                if *cancel.borrow() {
                                    tracing::info!("Worker '{}' shutting down", self.worker_id);
                                    break;
                                }
                            }
                            _ = time::sleep(poll_interval) => {}
                        }
                    }
                }
            }
        }

        tracing::info!(
            "Worker '{}' waiting for in-flight jobs to complete...",
            self.worker_id
        );

        let max_permits = self.config.concurrency as u32;
        let _ = tokio::time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits))
            .await;

        tracing::info!("Worker '{}' shut down complete", self.worker_id);
    }

    /// Poll for a job and execute it if available. Returns whether a job
    /// was claimed.
    async fn poll_and_execute(&self, semaphore: &Arc<tokio::sync::Semaphore>) -> bool {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::trace!("All worker slots occupied, waiting...");
                time::sleep(Duration::from_millis(50)).await;
                return false;
            }
        };

        for queue in &self.queues {
            match self
                .store
                .claim_next(queue, &self.worker_id, Utc::now())
                .await
            {
                Ok(Some(job)) => {
                    let store = Arc::clone(&self.store);
                    let executor = Arc::clone(&self.executor);
                    let config = self.config.clone();

                    tokio::spawn(async move {
                        let _permit = permit;
                        execute_claimed(store, executor, config, job).await;
                    });
                    return true;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Failed to claim job from '{}': {}", queue, e);
                }
            }
        }

        drop(permit);
        false
    }
}

/// Run one claimed job and settle its outcome in the store.
async fn execute_claimed(
    store: Arc<dyn JobStore>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
    job: Job,
) {
    tracing::info!(
        "Processing job: id={}, type='{}', attempt={}/{}",
        job.id,
        job.job_type,
        job.attempts,
        job.max_attempts
    );

    match executor.execute(&job).await {
        Ok(()) => {
            if let Err(e) = store.complete(job.id).await {
                tracing::error!("Failed to mark job {} as completed: {}", job.id, e);
            }
        }
        Err(JobExecutionError::Permanent(msg)) => {
            tracing::error!("Job {} failed permanently: {}", job.id, msg);
            if let Err(e) = store.mark_dead(job.id, &msg).await {
                tracing::error!("Failed to move job {} to the dead set: {}", job.id, e);
            }
        }
        Err(err @ (JobExecutionError::Transient(_) | JobExecutionError::Internal(_))) => {
            let msg = err.to_string();
            if job.can_retry() {
                let delay = retry_delay(&config, job.attempts);
                tracing::warn!(
                    "Job {} failed (attempt {}/{}), retrying in {:?}: {}",
                    job.id,
                    job.attempts,
                    job.max_attempts,
                    delay,
                    msg
                );
                let at = Utc::now()
                    + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
                if let Err(e) = store.retry_at(job.id, at, &msg).await {
                    tracing::error!("Failed to reschedule job {}: {}", job.id, e);
                }
            } else {
                tracing::error!("Job {} exhausted its attempts: {}", job.id, msg);
                if let Err(e) = store.mark_dead(job.id, &msg).await {
                    tracing::error!("Failed to move job {} to the dead set: {}", job.id, e);
                }
            }
        }
    }
}

/// Exponential backoff with jitter for the given (1-based) attempt count.
fn retry_delay(config: &WorkerConfig, attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).min(16) as u32;
    let base = config
        .retry_base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.retry_max_delay_ms);
    let jitter = rand::rng().random_range(0..=config.retry_base_delay_ms.max(1));
    Duration::from_millis(base.saturating_add(jitter))
}
