//! Expiration scheduling, worker, and sweep scenarios.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use marquee_core::config::worker::WorkerConfig;
use marquee_core::error::AppError;
use marquee_core::traits::scheduler::ExpirationScheduler;
use marquee_database::repositories::{JobStore, ReservationStore};
use marquee_entity::job::NewJob;
use marquee_entity::reservation::ReservationStatus;
use marquee_entity::seat::SeatStatus;
use marquee_worker::WorkerRunner;
use marquee_worker::queue::EXPIRATION_QUEUE;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_scheduled_job_expires_lapsed_hold_and_frees_seats() {
    // Zero-length hold: the reservation is overdue the moment it exists.
    let app = TestApp::with_hold_ttl(0).await;
    let a3 = app.seats[2];

    let r = app.service.create(app.request(&[a3])).await.unwrap();
    assert_eq!(r.remaining_seconds, 0);
    assert!(
        app.store.live_job_for_key(&r.id.to_string()).await.is_some(),
        "create must schedule an expiration job"
    );

    let processed = app.drain_due_jobs(Utc::now()).await;
    assert_eq!(processed, 1);

    let stored = app.store.find_by_id(r.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Expired);
    assert_eq!(app.seat(a3).await.status, SeatStatus::Available);

    // The freed seat can be booked again.
    app.service.create(app.request(&[a3])).await.unwrap();
}

#[tokio::test]
async fn test_late_job_fire_after_confirm_is_a_noop() {
    let app = TestApp::new().await;
    let r = app
        .service
        .create(app.request(&[app.seats[0]]))
        .await
        .unwrap();

    app.service.confirm(r.id).await.unwrap();

    // Simulate redelivery of the (cancelled) job well past the due time by
    // re-enqueuing it the way an at-least-once queue might.
    app.queue
        .schedule(r.id, r.expires_at)
        .await
        .expect("re-schedule after cancellation");
    let processed = app
        .drain_due_jobs(r.expires_at + chrono::Duration::seconds(5))
        .await;
    assert_eq!(processed, 1);

    // The worker's status re-check left everything sold.
    let stored = app.store.find_by_id(r.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Confirmed);
    assert_eq!(app.seat(app.seats[0]).await.status, SeatStatus::Sold);
}

#[tokio::test]
async fn test_early_job_fire_does_not_expire_a_live_hold() {
    let app = TestApp::new().await;
    let r = app
        .service
        .create(app.request(&[app.seats[0]]))
        .await
        .unwrap();

    // Force the job due now even though the hold has ~30s left.
    app.store
        .retry_at(
            app.store
                .live_job_for_key(&r.id.to_string())
                .await
                .expect("job scheduled")
                .id,
            Utc::now() - chrono::Duration::seconds(1),
            "redelivered early",
        )
        .await
        .unwrap();

    let processed = app.drain_due_jobs(Utc::now()).await;
    assert_eq!(processed, 1);

    let stored = app.store.find_by_id(r.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
    assert_eq!(app.seat(app.seats[0]).await.status, SeatStatus::Reserved);
}

#[tokio::test]
async fn test_sweep_reclaims_holds_without_jobs() {
    let app = TestApp::with_hold_ttl(0).await;
    let r = app
        .service
        .create(app.request(&[app.seats[0], app.seats[1]]))
        .await
        .unwrap();

    // Drop the scheduled job entirely: the sweep must self-heal.
    app.queue.cancel(r.id).await.unwrap();

    let count = app.service.sweep_expired().await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(app.seat(app.seats[0]).await.status, SeatStatus::Available);

    // Confirming the swept reservation now reports the terminal state.
    let err = app.service.confirm(r.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidState { ref current_status, .. } if current_status == "expired"
    ));
}

#[tokio::test]
async fn test_unknown_job_type_lands_in_the_dead_set() {
    let app = TestApp::new().await;
    let store = app.store.clone() as Arc<dyn JobStore>;

    store
        .insert(&NewJob {
            job_type: "mystery".to_string(),
            job_key: "mystery-1".to_string(),
            queue: EXPIRATION_QUEUE.to_string(),
            payload: serde_json::json!({}),
            max_attempts: 1,
            scheduled_at: None,
        })
        .await
        .unwrap();

    let processed = app.drain_due_jobs(Utc::now()).await;
    assert_eq!(processed, 1);

    let dead = app.store.dead_jobs().await;
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].job_key, "mystery-1");
    assert!(dead[0].error_message.as_deref().unwrap_or("").contains("mystery"));
}

#[tokio::test]
async fn test_worker_runner_drives_expiration_end_to_end() {
    let app = TestApp::with_hold_ttl(0).await;
    let r = app
        .service
        .create(app.request(&[app.seats[0]]))
        .await
        .unwrap();

    let runner = WorkerRunner::new(
        app.store.clone() as Arc<dyn JobStore>,
        Arc::clone(&app.executor),
        WorkerConfig {
            concurrency: 2,
            poll_interval_seconds: 0,
            ..WorkerConfig::default()
        },
        "test-runner".to_string(),
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });

    // Give the runner a few poll cycles to claim and execute the job.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let status = app
            .store
            .find_by_id(r.id)
            .await
            .unwrap()
            .map(|r| r.status);
        if status == Some(ReservationStatus::Expired) {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "runner never expired the reservation"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(app.seat(app.seats[0]).await.status, SeatStatus::Available);

    cancel_tx.send(true).expect("runner still listening");
    handle.await.expect("runner shuts down");
}
