//! Reservation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_entity::reservation::{NewReservation, Reservation, ReservationStatus};

use super::ReservationStore;

/// PostgreSQL-backed reservation state access.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Create a new reservation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn insert(&self, data: &NewReservation) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (session_id, user_id, user_email, expires_at) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(data.session_id)
        .bind(&data.user_id)
        .bind(&data.user_email)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database("Failed to create reservation", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("Failed to find reservation", e))
    }

    async fn transition_from_pending(&self, id: Uuid, to: ReservationStatus) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(to)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database("Failed to transition reservation", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_expired_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE status = 'pending' AND expires_at < $1 \
             ORDER BY expires_at ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database("Failed to query expired reservations", e))
    }
}
