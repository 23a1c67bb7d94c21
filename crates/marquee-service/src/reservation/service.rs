//! Reservation lifecycle manager.
//!
//! Orchestrates validation, distributed locking, state transitions, and
//! response assembly for create/confirm/cancel/read, plus the expiration
//! entry points used by the background worker and the sweep.
//!
//! Correctness under concurrency rests on two rules:
//! - only the current lock holder for a seat may move it out of available,
//!   and lock keys are always acquired in one global sort order;
//! - every transition out of `pending` is a conditional store update, so a
//!   racing confirm/cancel/expire loses by seeing zero rows changed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use marquee_cache::keys;
use marquee_core::config::reservation::ReservationConfig;
use marquee_core::error::AppError;
use marquee_core::result::AppResult;
use marquee_core::traits::lock::{AcquireOutcome, LockCoordinator};
use marquee_core::traits::scheduler::ExpirationScheduler;
use marquee_database::repositories::{
    ReservationStore, SaleStore, SeatStore, SessionStore,
};
use marquee_entity::reservation::{NewReservation, Reservation, ReservationStatus};
use marquee_entity::sale::NewSale;
use marquee_entity::seat::SeatStatus;

use super::mirror::{CacheMirror, ReservationSnapshot};
use super::view::{ReservationView, SaleView};

/// Input for creating a reservation.
#[derive(Debug, Clone)]
pub struct CreateReservation {
    /// The session to reserve seats in.
    pub session_id: Uuid,
    /// Requested seat ids (any order, duplicates tolerated).
    pub seat_ids: Vec<Uuid>,
    /// Opaque holder identity.
    pub user_id: String,
    /// Holder contact address.
    pub user_email: String,
}

/// Orchestrates the reservation state machine.
#[derive(Debug, Clone)]
pub struct ReservationService {
    sessions: Arc<dyn SessionStore>,
    seats: Arc<dyn SeatStore>,
    reservations: Arc<dyn ReservationStore>,
    sales: Arc<dyn SaleStore>,
    lock: Arc<dyn LockCoordinator>,
    scheduler: Arc<dyn ExpirationScheduler>,
    mirror: CacheMirror,
    config: ReservationConfig,
}

impl ReservationService {
    /// Create a new reservation service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        seats: Arc<dyn SeatStore>,
        reservations: Arc<dyn ReservationStore>,
        sales: Arc<dyn SaleStore>,
        lock: Arc<dyn LockCoordinator>,
        scheduler: Arc<dyn ExpirationScheduler>,
        mirror: CacheMirror,
        config: ReservationConfig,
    ) -> Self {
        Self {
            sessions,
            seats,
            reservations,
            sales,
            lock,
            scheduler,
            mirror,
            config,
        }
    }

    /// Create a new reservation, holding the requested seats for the
    /// configured window.
    ///
    /// Seat ids are deduplicated and sorted before lock keys are built, so
    /// every concurrent caller attempts acquisition in the same global
    /// order. A blocked acquisition fails with `Conflict` before any
    /// mutation; once locks are held, they are released on every exit path.
    pub async fn create(&self, request: CreateReservation) -> AppResult<ReservationView> {
        let CreateReservation {
            session_id,
            mut seat_ids,
            user_id,
            user_email,
        } = request;

        info!(%session_id, seats = seat_ids.len(), "Creating reservation");

        // Cheap precondition before any locking.
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("session", session_id))?;

        seat_ids.sort();
        seat_ids.dedup();

        let lock_keys: Vec<String> = seat_ids
            .iter()
            .map(|id| keys::seat_lock(session_id, *id))
            .collect();
        let token = Uuid::new_v4().to_string();
        let lock_ttl = Duration::from_secs(self.config.lock_ttl_seconds);

        match self.lock.acquire_all(&lock_keys, &token, lock_ttl).await? {
            AcquireOutcome::Blocked { key } => {
                let blocked_seat = lock_keys
                    .iter()
                    .position(|k| *k == key)
                    .map(|i| seat_ids[i].to_string())
                    .unwrap_or(key);
                warn!(seat = %blocked_seat, "Failed to acquire seat locks");
                return Err(AppError::conflict(
                    "One or more seats are currently being reserved by another user. \
                     Please try again.",
                    vec![blocked_seat],
                ));
            }
            AcquireOutcome::Acquired => {}
        }

        // Locks held from here: whatever happens below, release before
        // returning. A failed release only costs lock-TTL seconds.
        let result = self
            .create_locked(session_id, &seat_ids, user_id, user_email)
            .await;

        if let Err(e) = self.lock.release_all(&lock_keys, &token).await {
            error!(error = %e, "Failed to release seat locks; TTL will reclaim them");
        }

        result
    }

    /// The critical section of [`create`](Self::create): runs with every
    /// seat lock held.
    async fn create_locked(
        &self,
        session_id: Uuid,
        seat_ids: &[Uuid],
        user_id: String,
        user_email: String,
    ) -> AppResult<ReservationView> {
        let seats = self.seats.find_by_ids(seat_ids).await?;

        if seats.len() != seat_ids.len() {
            let found: HashSet<Uuid> = seats.iter().map(|s| s.id).collect();
            let missing: Vec<String> = seat_ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(ToString::to_string)
                .collect();
            return Err(AppError::NotFound {
                entity: "seat",
                id: missing.join(", "),
            });
        }

        if let Some(foreign) = seats.iter().find(|s| s.session_id != session_id) {
            return Err(AppError::invalid_state(
                "seat",
                foreign.id,
                format!("assigned to session {}", foreign.session_id),
                "reserve",
            ));
        }

        let unavailable: Vec<_> = seats.iter().filter(|s| !s.is_available()).collect();
        if !unavailable.is_empty() {
            let labels: Vec<&str> = unavailable.iter().map(|s| s.seat_number.as_str()).collect();
            return Err(AppError::conflict(
                format!("Seats already reserved or sold: {}", labels.join(", ")),
                unavailable.iter().map(|s| s.id.to_string()).collect(),
            ));
        }

        let expires_at =
            Utc::now() + chrono::Duration::seconds(self.config.hold_ttl_seconds as i64);
        let reservation = self
            .reservations
            .insert(&NewReservation {
                session_id,
                user_id,
                user_email,
                expires_at,
            })
            .await?;

        self.seats
            .set_status_many(seat_ids, SeatStatus::Reserved, Some(reservation.id))
            .await?;

        self.scheduler.schedule(reservation.id, expires_at).await?;

        self.mirror
            .write(&ReservationSnapshot::of(&reservation, seat_ids))
            .await?;

        info!(
            reservation = %reservation.id,
            seats = seat_ids.len(),
            "Reservation created"
        );
        Ok(ReservationView::assemble(&reservation, &seats, Utc::now()))
    }

    /// Confirm a pending reservation, converting it into a sale.
    ///
    /// Fails `Expired` if the hold already lapsed, completing the
    /// expiration on the spot so the seats go back on sale instead of
    /// dangling on a reservation the sweep can no longer see.
    pub async fn confirm(&self, id: Uuid) -> AppResult<SaleView> {
        info!(reservation = %id, "Confirming reservation");

        let reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("reservation", id))?;

        if reservation.status != ReservationStatus::Pending {
            return Err(AppError::invalid_state(
                "reservation",
                id,
                reservation.status.to_string(),
                "confirm",
            ));
        }

        if reservation.is_expired_at(Utc::now()) {
            self.expire_and_release(&reservation).await?;
            return Err(AppError::expired(id));
        }

        let seats = self.seats.find_by_reservation(id).await?;
        if seats.is_empty() {
            return Err(AppError::not_found("seats for reservation", id));
        }
        let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.id).collect();

        let session = self
            .sessions
            .find_by_id(reservation.session_id)
            .await?
            .ok_or_else(|| AppError::not_found("session", reservation.session_id))?;
        let amount_cents = session.ticket_price_cents * seats.len() as i64;

        // Flip before recording the sale: if a cancel or expiration won the
        // race, no sale row exists to clean up.
        if !self
            .reservations
            .transition_from_pending(id, ReservationStatus::Confirmed)
            .await?
        {
            let current = self
                .reservations
                .find_by_id(id)
                .await?
                .map(|r| r.status.to_string())
                .unwrap_or_else(|| "missing".to_string());
            return Err(AppError::invalid_state("reservation", id, current, "confirm"));
        }

        let sale = self
            .sales
            .insert(&NewSale {
                reservation_id: id,
                session_id: reservation.session_id,
                user_id: reservation.user_id.clone(),
                user_email: reservation.user_email.clone(),
                seat_ids: seat_ids.clone(),
                amount_cents,
            })
            .await?;

        self.seats
            .set_status_many(&seat_ids, SeatStatus::Sold, Some(id))
            .await?;

        self.mirror.delete(id).await?;

        // Best-effort: the worker re-checks status, so a job that fires
        // anyway is a harmless no-op.
        match self.scheduler.cancel(id).await {
            Ok(true) => debug!(reservation = %id, "Cancelled scheduled expiration"),
            Ok(false) => debug!(reservation = %id, "No pending expiration job to cancel"),
            Err(e) => warn!(reservation = %id, error = %e, "Failed to cancel expiration job"),
        }

        info!(
            sale = %sale.id,
            reservation = %id,
            amount_cents,
            "Reservation confirmed"
        );
        Ok(SaleView::assemble(&sale, &seats))
    }

    /// Cancel a pending reservation and release its seats.
    pub async fn cancel(&self, id: Uuid) -> AppResult<()> {
        info!(reservation = %id, "Cancelling reservation");

        let reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("reservation", id))?;

        if reservation.status != ReservationStatus::Pending {
            return Err(AppError::invalid_state(
                "reservation",
                id,
                reservation.status.to_string(),
                "cancel",
            ));
        }

        if !self
            .reservations
            .transition_from_pending(id, ReservationStatus::Cancelled)
            .await?
        {
            let current = self
                .reservations
                .find_by_id(id)
                .await?
                .map(|r| r.status.to_string())
                .unwrap_or_else(|| "missing".to_string());
            return Err(AppError::invalid_state("reservation", id, current, "cancel"));
        }

        let seats = self.seats.find_by_reservation(id).await?;
        let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.id).collect();
        if !seat_ids.is_empty() {
            self.seats
                .set_status_many(&seat_ids, SeatStatus::Available, None)
                .await?;
        }

        self.mirror.delete(id).await?;

        // No need to cancel the scheduled job: its own pending-check makes
        // the eventual fire a no-op.
        info!(
            reservation = %id,
            seats = seat_ids.len(),
            "Reservation cancelled, seats released"
        );
        Ok(())
    }

    /// Look up a finalized sale.
    pub async fn find_sale(&self, id: Uuid) -> AppResult<SaleView> {
        let sale = self
            .sales
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("sale", id))?;
        let seats = self.seats.find_by_ids(&sale.seat_ids).await?;
        Ok(SaleView::assemble(&sale, &seats))
    }

    /// Look up a reservation, preferring the cache mirror.
    ///
    /// Remaining validity is always recomputed from the wall clock at read
    /// time, and seat labels are fetched live.
    pub async fn find_one(&self, id: Uuid) -> AppResult<ReservationView> {
        let now = Utc::now();

        if let Some(snapshot) = self.mirror.read(id).await {
            debug!(reservation = %id, "Serving reservation from cache mirror");
            let seats = self.seats.find_by_ids(&snapshot.seat_ids).await?;
            return Ok(snapshot.into_view(&seats, now));
        }

        let reservation = self
            .reservations
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("reservation", id))?;
        let seats = self.seats.find_by_reservation(id).await?;
        Ok(ReservationView::assemble(&reservation, &seats, now))
    }

    /// Expire a reservation if it is pending and overdue.
    ///
    /// The entry point for the scheduled expiration worker. Missing,
    /// already-terminal, or not-yet-due reservations are quiet no-ops
    /// (at-least-once delivery makes all three normal); the job is never
    /// re-scheduled for an early fire, since the sweep backstops it.
    /// Returns whether this call performed the expiration.
    pub async fn expire_if_due(&self, id: Uuid) -> AppResult<bool> {
        let Some(reservation) = self.reservations.find_by_id(id).await? else {
            warn!(reservation = %id, "Reservation missing at expiration time");
            return Ok(false);
        };

        if reservation.status != ReservationStatus::Pending {
            debug!(
                reservation = %id,
                status = %reservation.status,
                "Reservation no longer pending, skipping expiration"
            );
            return Ok(false);
        }

        if !reservation.is_expired_at(Utc::now()) {
            warn!(reservation = %id, "Expiration fired before the hold lapsed, skipping");
            return Ok(false);
        }

        self.expire_and_release(&reservation).await
    }

    /// Expire every overdue pending reservation.
    ///
    /// The self-healing backstop for missed or duplicated scheduled jobs.
    /// Failures are isolated per reservation so one bad row never blocks
    /// the rest of the batch. Returns the number of reservations attempted.
    pub async fn sweep_expired(&self) -> AppResult<usize> {
        let expired = self.reservations.find_expired_pending(Utc::now()).await?;
        let total = expired.len();

        for reservation in &expired {
            if let Err(e) = self.expire_and_release(reservation).await {
                error!(
                    reservation = %reservation.id,
                    error = %e,
                    "Failed to expire reservation during sweep"
                );
            }
        }

        if total > 0 {
            info!(count = total, "Expiration sweep processed overdue reservations");
        }
        Ok(total)
    }

    /// Flip a pending reservation to expired and free its seats.
    ///
    /// Returns `false` when the conditional flip found the reservation
    /// already out of `pending` (a concurrent confirm/cancel/expire won).
    async fn expire_and_release(&self, reservation: &Reservation) -> AppResult<bool> {
        if !self
            .reservations
            .transition_from_pending(reservation.id, ReservationStatus::Expired)
            .await?
        {
            debug!(
                reservation = %reservation.id,
                "Reservation already transitioned, skipping expiration"
            );
            return Ok(false);
        }

        let seats = self.seats.find_by_reservation(reservation.id).await?;
        let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.id).collect();
        if !seat_ids.is_empty() {
            self.seats
                .set_status_many(&seat_ids, SeatStatus::Available, None)
                .await?;
        }

        info!(
            reservation = %reservation.id,
            seats = seat_ids.len(),
            "Reservation expired, seats released"
        );
        Ok(true)
    }
}
