//! Job repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_entity::job::{Job, NewJob};

use super::JobStore;

/// PostgreSQL-backed durable job queue.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn insert(&self, data: &NewJob) -> AppResult<Option<Job>> {
        // The partial unique index on (job_key) over live jobs makes the
        // insert a no-op when the key is already scheduled.
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (job_type, job_key, queue, payload, max_attempts, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (job_key) WHERE status IN ('pending', 'running') DO NOTHING \
             RETURNING *",
        )
        .bind(&data.job_type)
        .bind(&data.job_key)
        .bind(&data.queue)
        .bind(&data.payload)
        .bind(data.max_attempts)
        .bind(data.scheduled_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::queue("Failed to enqueue job", e))
    }

    async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', started_at = NOW(), worker_id = $2, \
             attempts = attempts + 1, updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE queue = $1 AND status = 'pending' \
                AND (scheduled_at IS NULL OR scheduled_at <= $3) \
                ORDER BY scheduled_at ASC NULLS FIRST, created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(queue)
        .bind(worker_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::queue("Failed to claim job", e))
    }

    async fn complete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::queue("Failed to complete job", e))?;
        Ok(())
    }

    async fn retry_at(&self, id: Uuid, at: DateTime<Utc>, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'pending', scheduled_at = $2, error_message = $3, \
             started_at = NULL, worker_id = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::queue("Failed to reschedule job", e))?;
        Ok(())
    }

    async fn mark_dead(&self, id: Uuid, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'dead', error_message = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::queue("Failed to mark job dead", e))?;
        Ok(())
    }

    async fn cancel_pending_by_key(&self, job_key: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'cancelled', updated_at = NOW() \
             WHERE job_key = $1 AND status = 'pending'",
        )
        .bind(job_key)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::queue("Failed to cancel job", e))?;
        Ok(result.rows_affected() > 0)
    }
}
