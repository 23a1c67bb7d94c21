//! Reservation lifecycle scenarios.

use uuid::Uuid;

use marquee_core::error::AppError;
use marquee_database::repositories::ReservationStore;
use marquee_entity::reservation::ReservationStatus;
use marquee_entity::seat::SeatStatus;

use crate::helpers::{TICKET_PRICE_CENTS, TestApp};

#[tokio::test]
async fn test_overlapping_holds_conflict_and_winner_confirms() {
    let app = TestApp::new().await;
    let [a1, a2, a3] = [app.seats[0], app.seats[1], app.seats[2]];

    // R1 takes A1+A2.
    let r1 = app.service.create(app.request(&[a1, a2])).await.unwrap();
    assert_eq!(app.seat(a1).await.status, SeatStatus::Reserved);
    assert_eq!(app.seat(a2).await.status, SeatStatus::Reserved);

    // R2 on A2+A3 collides on A2.
    let err = app.service.create(app.request(&[a2, a3])).await.unwrap_err();
    match &err {
        AppError::Conflict { offending, .. } => {
            assert_eq!(offending, &vec![a2.to_string()]);
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Confirming R1 sells both seats at price x count.
    let sale = app.service.confirm(r1.id).await.unwrap();
    assert_eq!(sale.amount_cents, 2 * TICKET_PRICE_CENTS);
    assert_eq!(app.seat(a1).await.status, SeatStatus::Sold);
    assert_eq!(app.seat(a2).await.status, SeatStatus::Sold);

    // A3 was never touched.
    assert_eq!(app.seat(a3).await.status, SeatStatus::Available);
    assert_eq!(app.seat(a3).await.reservation_id, None);
}

#[tokio::test]
async fn test_many_concurrent_creates_one_winner() {
    let app = TestApp::new().await;
    let contended = vec![app.seats[0], app.seats[1]];

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = app.service.clone();
        let request = app.request(&contended);
        handles.push(tokio::spawn(async move { service.create(request).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => winners += 1,
            Err(e) => assert!(
                matches!(e, AppError::Conflict { .. }),
                "losers must observe Conflict, got {e:?}"
            ),
        }
    }
    assert_eq!(winners, 1, "exactly one concurrent create may win");
}

#[tokio::test]
async fn test_fresh_reservation_reports_remaining_window() {
    let app = TestApp::new().await;
    let view = app
        .service
        .create(app.request(&[app.seats[0]]))
        .await
        .unwrap();
    assert!(
        view.remaining_seconds > 25 && view.remaining_seconds <= 30,
        "got {}",
        view.remaining_seconds
    );

    // Read-back recomputes from the wall clock, via the cache mirror.
    let read = app.service.find_one(view.id).await.unwrap();
    assert!(read.remaining_seconds <= view.remaining_seconds);
    assert_eq!(read.seat_numbers, vec!["A1"]);
}

#[tokio::test]
async fn test_cancel_frees_seats_for_rebooking() {
    let app = TestApp::new().await;
    let r = app
        .service
        .create(app.request(&[app.seats[0], app.seats[1]]))
        .await
        .unwrap();

    app.service.cancel(r.id).await.unwrap();
    assert_eq!(app.seat(app.seats[0]).await.status, SeatStatus::Available);

    let stored = app.store.find_by_id(r.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Cancelled);

    // Cancelled is terminal.
    let err = app.service.cancel(r.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidState { ref current_status, .. } if current_status == "cancelled"
    ));

    // Seats can be taken again.
    app.service
        .create(app.request(&[app.seats[0], app.seats[1]]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_find_one_unknown_reservation_is_not_found() {
    let app = TestApp::new().await;
    let err = app.service.find_one(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::NotFound { entity: "reservation", .. }
    ));
}

#[tokio::test]
async fn test_mirror_entry_lives_and_dies_with_the_hold() {
    let app = TestApp::new().await;
    let r = app
        .service
        .create(app.request(&[app.seats[0]]))
        .await
        .unwrap();

    let key = marquee_cache::keys::reservation_snapshot(r.id);
    use marquee_core::traits::cache::CacheProvider;
    let ttl = app.cache.ttl(&key).await.unwrap().expect("snapshot cached");
    assert!(ttl <= 30);

    app.service.confirm(r.id).await.unwrap();
    assert!(!app.cache.exists(&key).await.unwrap());

    // The store still answers after the mirror entry is gone.
    let read = app.service.find_one(r.id).await.unwrap();
    assert_eq!(read.status, ReservationStatus::Confirmed);
}
