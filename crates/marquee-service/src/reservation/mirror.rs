//! Fast-read cache mirror of active reservations.
//!
//! A write-through snapshot keyed by reservation id, with TTL equal to the
//! hold's remaining validity. The durable store stays authoritative: the
//! mirror is deleted on confirm/cancel, and natural TTL eviction on expiry
//! is a second safety net independent of the expiration scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use marquee_cache::keys;
use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_core::traits::cache::CacheProvider;
use marquee_entity::reservation::{Reservation, ReservationStatus};
use marquee_entity::seat::Seat;

use super::view::ReservationView;

/// Cached projection of an active reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    /// Reservation identifier.
    pub id: Uuid,
    /// The session whose seats are held.
    pub session_id: Uuid,
    /// Held seat ids.
    pub seat_ids: Vec<Uuid>,
    /// Opaque holder identity.
    pub user_id: String,
    /// Holder contact address.
    pub user_email: String,
    /// Status at snapshot time.
    pub status: ReservationStatus,
    /// When the reservation was created.
    pub created_at: DateTime<Utc>,
    /// When the hold lapses.
    pub expires_at: DateTime<Utc>,
}

impl ReservationSnapshot {
    /// Snapshot a reservation and its held seat ids.
    pub fn of(reservation: &Reservation, seat_ids: &[Uuid]) -> Self {
        Self {
            id: reservation.id,
            session_id: reservation.session_id,
            seat_ids: seat_ids.to_vec(),
            user_id: reservation.user_id.clone(),
            user_email: reservation.user_email.clone(),
            status: reservation.status,
            created_at: reservation.created_at,
            expires_at: reservation.expires_at,
        }
    }

    /// Seconds of validity left at `now`, clamped to zero.
    ///
    /// Recomputed from the wall clock at every read; the snapshot never
    /// stores a countdown.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Build a caller-facing view, fetching current labels from `seats`.
    pub fn into_view(self, seats: &[Seat], now: DateTime<Utc>) -> ReservationView {
        let remaining_seconds = self.remaining_seconds(now);
        ReservationView {
            id: self.id,
            session_id: self.session_id,
            seat_ids: self.seat_ids,
            seat_numbers: seats.iter().map(|s| s.seat_number.clone()).collect(),
            user_id: self.user_id,
            user_email: self.user_email,
            status: self.status,
            created_at: self.created_at,
            expires_at: self.expires_at,
            remaining_seconds,
        }
    }
}

/// Write-through cache of reservation snapshots.
#[derive(Debug, Clone)]
pub struct CacheMirror {
    cache: Arc<dyn CacheProvider>,
}

impl CacheMirror {
    /// Create a mirror over the given cache backend.
    pub fn new(cache: Arc<dyn CacheProvider>) -> Self {
        Self { cache }
    }

    /// Store a snapshot with TTL equal to its remaining validity.
    ///
    /// A snapshot that has already lapsed is not written at all.
    pub async fn write(&self, snapshot: &ReservationSnapshot) -> AppResult<()> {
        let remaining = snapshot.remaining_seconds(Utc::now());
        if remaining <= 0 {
            return Ok(());
        }
        let json = serde_json::to_string(snapshot)
            .map_err(|e| AppError::cache("Failed to encode reservation snapshot", e))?;
        self.cache
            .set(
                &keys::reservation_snapshot(snapshot.id),
                &json,
                Duration::from_secs(remaining as u64),
            )
            .await
    }

    /// Read a snapshot, degrading to a miss on any mirror failure.
    ///
    /// The durable store is authoritative, so an unreachable cache or an
    /// unparseable entry must not fail the read path.
    pub async fn read(&self, id: Uuid) -> Option<ReservationSnapshot> {
        match self.cache.get(&keys::reservation_snapshot(id)).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(reservation = %id, error = %e, "Discarding unparseable cached snapshot");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(reservation = %id, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    /// Remove the snapshot for a reservation.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.cache.delete(&keys::reservation_snapshot(id)).await
    }
}
