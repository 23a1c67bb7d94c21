//! In-memory store implementation.
//!
//! Implements every store trait over a single `tokio::sync::RwLock`, for
//! single-node deployments and tests. Note that the store is not what makes
//! reservations safe under concurrency — the lock coordinator is — so the
//! coarse lock here only has to provide per-call consistency.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use marquee_core::result::AppResult;
use marquee_entity::job::{Job, JobStatus, NewJob};
use marquee_entity::reservation::{NewReservation, Reservation, ReservationStatus};
use marquee_entity::sale::{NewSale, Sale};
use marquee_entity::seat::{Seat, SeatStatus};
use marquee_entity::session::Session;

use crate::repositories::{JobStore, ReservationStore, SaleStore, SeatStore, SessionStore};

/// All entity tables behind one lock.
#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<Uuid, Session>,
    seats: HashMap<Uuid, Seat>,
    reservations: HashMap<Uuid, Reservation>,
    sales: HashMap<Uuid, Sale>,
    jobs: HashMap<Uuid, Job>,
}

/// In-memory implementation of every Marquee store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session.
    pub async fn add_session(&self, session: Session) {
        self.inner
            .write()
            .await
            .sessions
            .insert(session.id, session);
    }

    /// Seed a seat.
    pub async fn add_seat(&self, seat: Seat) {
        self.inner.write().await.seats.insert(seat.id, seat);
    }

    /// Look up the live (pending or running) job for a key, if any.
    pub async fn live_job_for_key(&self, job_key: &str) -> Option<Job> {
        self.inner
            .read()
            .await
            .jobs
            .values()
            .find(|j| j.job_key == job_key && !j.status.is_terminal())
            .cloned()
    }

    /// All jobs currently in the dead set.
    pub async fn dead_jobs(&self) -> Vec<Job> {
        self.inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.status == JobStatus::Dead)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        Ok(self.inner.read().await.sessions.get(&id).cloned())
    }
}

#[async_trait]
impl SeatStore for MemoryStore {
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Seat>> {
        let inner = self.inner.read().await;
        let mut seats: Vec<Seat> = ids
            .iter()
            .filter_map(|id| inner.seats.get(id).cloned())
            .collect();
        seats.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
        Ok(seats)
    }

    async fn find_by_reservation(&self, reservation_id: Uuid) -> AppResult<Vec<Seat>> {
        let inner = self.inner.read().await;
        let mut seats: Vec<Seat> = inner
            .seats
            .values()
            .filter(|s| s.reservation_id == Some(reservation_id))
            .cloned()
            .collect();
        seats.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
        Ok(seats)
    }

    async fn set_status_many(
        &self,
        ids: &[Uuid],
        status: SeatStatus,
        reservation_id: Option<Uuid>,
    ) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let mut updated = 0;
        for id in ids {
            if let Some(seat) = inner.seats.get_mut(id) {
                seat.status = status;
                seat.reservation_id = reservation_id;
                seat.updated_at = Utc::now();
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert(&self, data: &NewReservation) -> AppResult<Reservation> {
        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            session_id: data.session_id,
            user_id: data.user_id.clone(),
            user_email: data.user_email.clone(),
            status: ReservationStatus::Pending,
            expires_at: data.expires_at,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Reservation>> {
        Ok(self.inner.read().await.reservations.get(&id).cloned())
    }

    async fn transition_from_pending(&self, id: Uuid, to: ReservationStatus) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.reservations.get_mut(&id) {
            Some(reservation) if reservation.status == ReservationStatus::Pending => {
                reservation.status = to;
                reservation.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_expired_pending(&self, now: DateTime<Utc>) -> AppResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut expired: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Pending && r.expires_at < now)
            .cloned()
            .collect();
        expired.sort_by_key(|r| r.expires_at);
        Ok(expired)
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn insert(&self, data: &NewSale) -> AppResult<Sale> {
        let sale = Sale {
            id: Uuid::new_v4(),
            reservation_id: data.reservation_id,
            session_id: data.session_id,
            user_id: data.user_id.clone(),
            user_email: data.user_email.clone(),
            seat_ids: data.seat_ids.clone(),
            amount_cents: data.amount_cents,
            created_at: Utc::now(),
        };
        self.inner.write().await.sales.insert(sale.id, sale.clone());
        Ok(sale)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Sale>> {
        Ok(self.inner.read().await.sales.get(&id).cloned())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert(&self, data: &NewJob) -> AppResult<Option<Job>> {
        let mut inner = self.inner.write().await;
        let already_live = inner
            .jobs
            .values()
            .any(|j| j.job_key == data.job_key && !j.status.is_terminal());
        if already_live {
            return Ok(None);
        }
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            job_type: data.job_type.clone(),
            job_key: data.job_key.clone(),
            queue: data.queue.clone(),
            payload: data.payload.clone(),
            error_message: None,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: data.max_attempts,
            scheduled_at: data.scheduled_at,
            started_at: None,
            completed_at: None,
            worker_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(job.id, job.clone());
        Ok(Some(job))
    }

    async fn claim_next(
        &self,
        queue: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>> {
        let mut inner = self.inner.write().await;
        let candidate = inner
            .jobs
            .values()
            .filter(|j| {
                j.queue == queue
                    && j.status == JobStatus::Pending
                    && j.scheduled_at.map(|at| at <= now).unwrap_or(true)
            })
            .min_by_key(|j| (j.scheduled_at, j.created_at))
            .map(|j| j.id);

        let Some(id) = candidate else {
            return Ok(None);
        };
        match inner.jobs.get_mut(&id) {
            Some(job) => {
                job.status = JobStatus::Running;
                job.started_at = Some(now);
                job.worker_id = Some(worker_id.to_string());
                job.attempts += 1;
                job.updated_at = now;
                Ok(Some(job.clone()))
            }
            None => Ok(None),
        }
    }

    async fn complete(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn retry_at(&self, id: Uuid, at: DateTime<Utc>, error: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.status = JobStatus::Pending;
            job.scheduled_at = Some(at);
            job.error_message = Some(error.to_string());
            job.started_at = None;
            job.worker_id = None;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_dead(&self, id: Uuid, error: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(job) = inner.jobs.get_mut(&id) {
            job.status = JobStatus::Dead;
            job.error_message = Some(error.to_string());
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cancel_pending_by_key(&self, job_key: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let id = inner
            .jobs
            .values()
            .find(|j| j.job_key == job_key && j.status == JobStatus::Pending)
            .map(|j| j.id);
        match id.and_then(|id| inner.jobs.get_mut(&id)) {
            Some(job) => {
                job.status = JobStatus::Cancelled;
                job.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
