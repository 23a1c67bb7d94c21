//! Sale repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_entity::sale::{NewSale, Sale};

use super::SaleStore;

/// PostgreSQL-backed sale records.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: PgPool,
}

impl SaleRepository {
    /// Create a new sale repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn insert(&self, data: &NewSale) -> AppResult<Sale> {
        sqlx::query_as::<_, Sale>(
            "INSERT INTO sales (reservation_id, session_id, user_id, user_email, seat_ids, amount_cents) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.reservation_id)
        .bind(data.session_id)
        .bind(&data.user_id)
        .bind(&data.user_email)
        .bind(&data.seat_ids)
        .bind(data.amount_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database("Failed to create sale", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Sale>> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("Failed to find sale", e))
    }
}
