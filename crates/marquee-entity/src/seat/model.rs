//! Seat entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::SeatStatus;

/// A single seat in a cinema session.
///
/// Invariant: `status` is `Reserved` or `Sold` if and only if
/// `reservation_id` is set, and at most one reservation ever holds a seat
/// at a time. Seats are mutated only by the lifecycle manager while holding
/// the seat's distributed lock, or by the expiration worker/sweep.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Seat {
    /// Unique seat identifier.
    pub id: Uuid,
    /// The session this seat belongs to.
    pub session_id: Uuid,
    /// Human label, e.g. `"A1"` or `"C10"`.
    pub seat_number: String,
    /// Current availability status.
    pub status: SeatStatus,
    /// The reservation currently holding this seat, if any.
    pub reservation_id: Option<Uuid>,
    /// When the seat was created.
    pub created_at: DateTime<Utc>,
    /// When the seat was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    /// Check whether the seat can be taken by a new reservation.
    pub fn is_available(&self) -> bool {
        matches!(self.status, SeatStatus::Available)
    }
}
