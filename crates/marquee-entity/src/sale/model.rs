//! Sale entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A finalized purchase, produced by confirming a reservation.
///
/// Created once and immutable thereafter; a sale exists only for confirmed
/// reservations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    /// Unique sale identifier.
    pub id: Uuid,
    /// The reservation that was confirmed.
    pub reservation_id: Uuid,
    /// The session the seats belong to.
    pub session_id: Uuid,
    /// Opaque buyer identity.
    pub user_id: String,
    /// Buyer contact address.
    pub user_email: String,
    /// The seats covered by this sale.
    pub seat_ids: Vec<Uuid>,
    /// Total charged, in integer cents (ticket price x seat count).
    pub amount_cents: i64,
    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,
}

/// Data required to record a new sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    /// The reservation being confirmed.
    pub reservation_id: Uuid,
    /// The session the seats belong to.
    pub session_id: Uuid,
    /// Opaque buyer identity.
    pub user_id: String,
    /// Buyer contact address.
    pub user_email: String,
    /// The seats covered by this sale.
    pub seat_ids: Vec<Uuid>,
    /// Total charged, in integer cents.
    pub amount_cents: i64,
}
