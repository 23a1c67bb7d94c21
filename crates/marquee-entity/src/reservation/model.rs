//! Reservation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::ReservationStatus;

/// A time-bounded hold on one or more seats, pending confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: Uuid,
    /// The session whose seats are held.
    pub session_id: Uuid,
    /// Opaque holder identity (user management is external).
    pub user_id: String,
    /// Holder contact address.
    pub user_email: String,
    /// Current lifecycle status.
    pub status: ReservationStatus,
    /// When the hold lapses unless confirmed.
    pub expires_at: DateTime<Utc>,
    /// When the reservation was created.
    pub created_at: DateTime<Utc>,
    /// When the reservation was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Check whether the hold window has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Seconds of validity left at `now`, clamped to zero.
    ///
    /// Always recomputed from the wall clock; a stored countdown is never
    /// trusted.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Data required to create a new reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    /// The session whose seats are held.
    pub session_id: Uuid,
    /// Opaque holder identity.
    pub user_id: String,
    /// Holder contact address.
    pub user_email: String,
    /// When the hold lapses.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation_expiring_in(seconds: i64) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            user_email: "user@example.com".to_string(),
            status: ReservationStatus::Pending,
            expires_at: now + Duration::seconds(seconds),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_remaining_seconds_clamps_to_zero() {
        let reservation = reservation_expiring_in(-5);
        assert_eq!(reservation.remaining_seconds(Utc::now()), 0);
    }

    #[test]
    fn test_fresh_reservation_remaining_window() {
        let reservation = reservation_expiring_in(30);
        let remaining = reservation.remaining_seconds(Utc::now());
        assert!(remaining > 25 && remaining <= 30, "got {remaining}");
    }
}
