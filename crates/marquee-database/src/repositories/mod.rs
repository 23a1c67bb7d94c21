//! Store traits and their PostgreSQL repository implementations.
//!
//! The reservation core only ever talks to these traits; whether the rows
//! live in PostgreSQL or the in-memory store is a wiring decision. The
//! store provides durability, not mutual exclusion — double-booking safety
//! comes from the lock coordinator, not from store-level isolation.

pub mod job;
pub mod reservation;
pub mod sale;
pub mod seat;
pub mod session;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use marquee_core::result::AppResult;
use marquee_entity::job::{Job, NewJob};
use marquee_entity::reservation::{NewReservation, Reservation, ReservationStatus};
use marquee_entity::sale::{NewSale, Sale};
use marquee_entity::seat::{Seat, SeatStatus};
use marquee_entity::session::Session;

pub use job::JobRepository;
pub use reservation::ReservationRepository;
pub use sale::SaleRepository;
pub use seat::SeatRepository;
pub use session::SessionRepository;

/// Read access to cinema sessions (managed elsewhere, consumed here).
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a session by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;
}

/// Seat state access.
#[async_trait]
pub trait SeatStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load seats by id set. Missing ids are simply absent from the result.
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Seat>>;

    /// Load the seats currently referencing a reservation.
    async fn find_by_reservation(&self, reservation_id: Uuid) -> AppResult<Vec<Seat>>;

    /// Batch-update status and reservation back-reference for an id set.
    ///
    /// Passing `reservation_id = None` clears the back-reference (release
    /// to available). Returns the number of seats updated.
    async fn set_status_many(
        &self,
        ids: &[Uuid],
        status: SeatStatus,
        reservation_id: Option<Uuid>,
    ) -> AppResult<u64>;
}

/// Reservation state access.
#[async_trait]
pub trait ReservationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new pending reservation.
    async fn insert(&self, data: &NewReservation) -> AppResult<Reservation>;

    /// Find a reservation by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Reservation>>;

    /// Conditionally move a reservation out of `pending`.
    ///
    /// Executes as a single `UPDATE ... WHERE status = 'pending'`; returns
    /// `false` when no row changed because the reservation was already in a
    /// terminal state. This is how racing transitions lose cleanly instead
    /// of overwriting each other.
    async fn transition_from_pending(&self, id: Uuid, to: ReservationStatus) -> AppResult<bool>;

    /// All pending reservations whose expiry has passed at `now`.
    async fn find_expired_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<Reservation>>;
}

/// Sale record access.
#[async_trait]
pub trait SaleStore: Send + Sync + std::fmt::Debug + 'static {
    /// Record a new sale.
    async fn insert(&self, data: &NewSale) -> AppResult<Sale>;

    /// Find a sale by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Sale>>;
}

/// Durable job queue access.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new job.
    ///
    /// Returns `None` when a live (pending or running) job with the same
    /// `job_key` already exists, making scheduling idempotent.
    async fn insert(&self, data: &NewJob) -> AppResult<Option<Job>>;

    /// Claim the next due pending job from a queue for `worker_id`.
    ///
    /// The claim must be safe under concurrent workers (`FOR UPDATE SKIP
    /// LOCKED` in PostgreSQL) and increments the attempt counter.
    async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>>;

    /// Mark a job as successfully completed.
    async fn complete(&self, id: Uuid) -> AppResult<()>;

    /// Return a job to pending with a new due time after a transient failure.
    async fn retry_at(&self, id: Uuid, at: DateTime<Utc>, error: &str) -> AppResult<()>;

    /// Move a job to the dead set, preserving the final error.
    async fn mark_dead(&self, id: Uuid, error: &str) -> AppResult<()>;

    /// Cancel the still-pending job with the given key, if one exists.
    async fn cancel_pending_by_key(&self, job_key: &str) -> AppResult<bool>;
}
