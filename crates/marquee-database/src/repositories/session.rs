//! Session repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_entity::session::Session;

use super::SessionStore;

/// PostgreSQL-backed session lookups.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("Failed to find session", e))
    }
}
