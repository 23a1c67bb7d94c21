//! Seat repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_entity::seat::{Seat, SeatStatus};

use super::SeatStore;

/// PostgreSQL-backed seat state access.
#[derive(Debug, Clone)]
pub struct SeatRepository {
    pool: PgPool,
}

impl SeatRepository {
    /// Create a new seat repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatStore for SeatRepository {
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Seat>> {
        sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE id = ANY($1) ORDER BY seat_number")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database("Failed to load seats", e))
    }

    async fn find_by_reservation(&self, reservation_id: Uuid) -> AppResult<Vec<Seat>> {
        sqlx::query_as::<_, Seat>(
            "SELECT * FROM seats WHERE reservation_id = $1 ORDER BY seat_number",
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database("Failed to load seats by reservation", e))
    }

    async fn set_status_many(
        &self,
        ids: &[Uuid],
        status: SeatStatus,
        reservation_id: Option<Uuid>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE seats SET status = $2, reservation_id = $3, updated_at = NOW() \
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(status)
        .bind(reservation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database("Failed to update seat status", e))?;
        Ok(result.rows_affected())
    }
}
