//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use marquee_cache::memory::{MemoryCacheProvider, MemoryLockCoordinator};
use marquee_core::config::reservation::ReservationConfig;
use marquee_database::memory::MemoryStore;
use marquee_database::repositories::JobStore;
use marquee_entity::seat::{Seat, SeatStatus};
use marquee_entity::session::Session;
use marquee_service::ReservationService;
use marquee_service::reservation::{CacheMirror, CreateReservation};
use marquee_worker::ExpirationQueue;
use marquee_worker::executor::JobExecutor;
use marquee_worker::jobs::{ExpirationJobHandler, SweepJobHandler};
use marquee_worker::queue::EXPIRATION_QUEUE;

/// Ticket price used by every seeded session.
pub const TICKET_PRICE_CENTS: i64 = 4_000;

/// Test application context: the full reservation core wired over the
/// in-memory backends, with one session and seats A1..A3 seeded.
pub struct TestApp {
    /// The lifecycle manager under test.
    pub service: Arc<ReservationService>,
    /// Shared store, for direct assertions.
    pub store: Arc<MemoryStore>,
    /// Cache backend, for mirror assertions.
    pub cache: Arc<MemoryCacheProvider>,
    /// The real durable queue.
    pub queue: Arc<ExpirationQueue>,
    /// Executor with the expiration and sweep handlers registered.
    pub executor: Arc<JobExecutor>,
    /// The seeded session.
    pub session_id: Uuid,
    /// Seeded seat ids, in label order A1, A2, A3.
    pub seats: Vec<Uuid>,
}

impl TestApp {
    /// Create a test application with the default 30s hold window.
    pub async fn new() -> Self {
        Self::with_hold_ttl(30).await
    }

    /// Create a test application with a custom hold window.
    pub async fn with_hold_ttl(hold_ttl_seconds: u64) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCacheProvider::new());
        let lock = Arc::new(MemoryLockCoordinator::new());

        let now = Utc::now();
        let session_id = Uuid::new_v4();
        store
            .add_session(Session {
                id: session_id,
                movie_name: "Night Train".to_string(),
                room_number: "1".to_string(),
                start_time: now + chrono::Duration::hours(1),
                end_time: now + chrono::Duration::hours(3),
                ticket_price_cents: TICKET_PRICE_CENTS,
                created_at: now,
                updated_at: now,
            })
            .await;

        let mut seats = Vec::new();
        for label in ["A1", "A2", "A3"] {
            let seat_id = Uuid::new_v4();
            store
                .add_seat(Seat {
                    id: seat_id,
                    session_id,
                    seat_number: label.to_string(),
                    status: SeatStatus::Available,
                    reservation_id: None,
                    created_at: now,
                    updated_at: now,
                })
                .await;
            seats.push(seat_id);
        }

        let queue = Arc::new(ExpirationQueue::new(
            store.clone() as Arc<dyn JobStore>,
            5,
        ));

        let service = Arc::new(ReservationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            lock,
            Arc::clone(&queue) as _,
            CacheMirror::new(cache.clone()),
            ReservationConfig {
                hold_ttl_seconds,
                lock_ttl_seconds: 10,
            },
        ));

        let mut executor = JobExecutor::new();
        executor.register(Arc::new(ExpirationJobHandler::new(Arc::clone(&service))));
        executor.register(Arc::new(SweepJobHandler::new(Arc::clone(&service))));

        Self {
            service,
            store,
            cache,
            queue,
            executor: Arc::new(executor),
            session_id,
            seats,
        }
    }

    /// Build a create request for the given seats.
    pub fn request(&self, seats: &[Uuid]) -> CreateReservation {
        CreateReservation {
            session_id: self.session_id,
            seat_ids: seats.to_vec(),
            user_id: "user-1".to_string(),
            user_email: "user@example.com".to_string(),
        }
    }

    /// Load a seat for assertions.
    pub async fn seat(&self, id: Uuid) -> Seat {
        use marquee_database::repositories::SeatStore;
        SeatStore::find_by_ids(self.store.as_ref(), &[id])
            .await
            .expect("store reachable")
            .into_iter()
            .next()
            .expect("seat exists")
    }

    /// Claim and execute every job due at `now`, settling outcomes the way
    /// the worker runner does. Returns the number of jobs processed.
    pub async fn drain_due_jobs(&self, now: DateTime<Utc>) -> usize {
        let store = self.store.clone() as Arc<dyn JobStore>;
        let mut processed = 0;
        while let Some(job) = store
            .claim_next(EXPIRATION_QUEUE, "test-worker", now)
            .await
            .expect("claim succeeds")
        {
            match self.executor.execute(&job).await {
                Ok(()) => store.complete(job.id).await.expect("complete"),
                Err(e) => store.mark_dead(job.id, &e.to_string()).await.expect("dead"),
            }
            processed += 1;
        }
        processed
    }
}
