//! Response views assembled by the lifecycle manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_entity::reservation::{Reservation, ReservationStatus};
use marquee_entity::sale::Sale;
use marquee_entity::seat::Seat;

/// Caller-facing projection of a reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationView {
    /// Reservation identifier.
    pub id: Uuid,
    /// The session whose seats are held.
    pub session_id: Uuid,
    /// Held seat ids.
    pub seat_ids: Vec<Uuid>,
    /// Held seat labels, e.g. `["A1", "A2"]`.
    pub seat_numbers: Vec<String>,
    /// Opaque holder identity.
    pub user_id: String,
    /// Holder contact address.
    pub user_email: String,
    /// Current lifecycle status.
    pub status: ReservationStatus,
    /// When the reservation was created.
    pub created_at: DateTime<Utc>,
    /// When the hold lapses.
    pub expires_at: DateTime<Utc>,
    /// Validity left at assembly time, recomputed from the wall clock.
    pub remaining_seconds: i64,
}

impl ReservationView {
    /// Build a view from a stored reservation and its seats.
    pub fn assemble(reservation: &Reservation, seats: &[Seat], now: DateTime<Utc>) -> Self {
        Self {
            id: reservation.id,
            session_id: reservation.session_id,
            seat_ids: seats.iter().map(|s| s.id).collect(),
            seat_numbers: seats.iter().map(|s| s.seat_number.clone()).collect(),
            user_id: reservation.user_id.clone(),
            user_email: reservation.user_email.clone(),
            status: reservation.status,
            created_at: reservation.created_at,
            expires_at: reservation.expires_at,
            remaining_seconds: reservation.remaining_seconds(now),
        }
    }
}

/// Caller-facing projection of a finalized sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleView {
    /// Sale identifier.
    pub id: Uuid,
    /// The confirmed reservation.
    pub reservation_id: Uuid,
    /// The session the seats belong to.
    pub session_id: Uuid,
    /// Sold seat ids.
    pub seat_ids: Vec<Uuid>,
    /// Sold seat labels.
    pub seat_numbers: Vec<String>,
    /// Buyer contact address.
    pub user_email: String,
    /// Total charged, in integer cents.
    pub amount_cents: i64,
    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,
}

impl SaleView {
    /// Build a view from a stored sale and its seats.
    pub fn assemble(sale: &Sale, seats: &[Seat]) -> Self {
        Self {
            id: sale.id,
            reservation_id: sale.reservation_id,
            session_id: sale.session_id,
            seat_ids: sale.seat_ids.clone(),
            seat_numbers: seats.iter().map(|s| s.seat_number.clone()).collect(),
            user_email: sale.user_email.clone(),
            amount_cents: sale.amount_cents,
            created_at: sale.created_at,
        }
    }
}
