mod common;

use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use common::{days_from_today, TestApp};
use hotel_backend::domain::models::booking::{Booking, BookingStatus, NewBookingParams, StayQuote};
use hotel_backend::domain::models::guest::{Guest, NewGuestParams};
use hotel_backend::domain::models::room::{NewRoomParams, Room};
use hotel_backend::domain::ports::{BookingRepository, GuestRepository, RoomCatalog, UnitOfWork};
use hotel_backend::domain::services::booking_service::{BookingService, CreateBookingCommand, UpdateBookingCommand};
use hotel_backend::error::AppError;
use hotel_backend::infra::context::SqliteContext;
use hotel_backend::infra::repositories::{sqlite_booking_repo::SqliteBookingRepo, sqlite_guest_repo::SqliteGuestRepo};

/// Room source that lives outside the database, like a remote room service.
struct FixedRooms(Vec<Room>);

#[async_trait]
impl RoomCatalog for FixedRooms {
    async fn get_room(&self, room_id: i64) -> Result<Option<Room>, AppError> {
        Ok(self.0.iter().find(|r| r.id == room_id).cloned())
    }
}

fn room(id: i64, number: &str, price: f64) -> Room {
    let mut room = Room::new(NewRoomParams {
        room_number: number.to_string(),
        room_type: "Double".to_string(),
        price_per_night: price,
        capacity: 2,
        is_available: true,
        description: None,
    });
    room.id = id;
    room
}

fn guest(email: &str) -> Guest {
    Guest::new(NewGuestParams {
        first_name: "Test".to_string(),
        last_name: "Guest".to_string(),
        email: email.to_string(),
        phone: "5551234".to_string(),
        address: None,
        date_of_birth: None,
    })
}

struct Harness {
    ctx: Arc<SqliteContext>,
    bookings: Arc<SqliteBookingRepo>,
    guests: Arc<SqliteGuestRepo>,
    service: BookingService,
}

fn harness(app: &TestApp) -> Harness {
    let ctx = Arc::new(SqliteContext::new(app.pool.clone()));
    let bookings = Arc::new(SqliteBookingRepo::new(ctx.clone()));
    let guests = Arc::new(SqliteGuestRepo::new(ctx.clone()));
    let rooms = Arc::new(FixedRooms(vec![room(1, "101", 100.0), room(2, "102", 150.0)]));
    let service = BookingService::new(ctx.clone(), bookings.clone(), guests.clone(), rooms);
    Harness { ctx, bookings, guests, service }
}

#[tokio::test]
async fn test_begin_twice_fails_and_idle_commit_is_noop() {
    let app = TestApp::new().await;
    let ctx = SqliteContext::new(app.pool.clone());

    ctx.commit_transaction().await.unwrap();
    ctx.rollback_transaction().await.unwrap();
    assert!(!ctx.in_transaction().await);

    ctx.begin_transaction().await.unwrap();
    assert!(ctx.in_transaction().await);
    let err = ctx.begin_transaction().await.unwrap_err();
    assert_eq!(err.to_string(), "A transaction is already in progress");

    ctx.commit_transaction().await.unwrap();
    assert!(!ctx.in_transaction().await);
}

#[tokio::test]
async fn test_rollback_discards_writes_and_commit_keeps_them() {
    let app = TestApp::new().await;
    let h = harness(&app);

    h.ctx.begin_transaction().await.unwrap();
    let discarded = h.guests.create(&guest("ghost@example.com")).await.unwrap();
    assert_eq!(h.ctx.save_changes().await.unwrap(), 1);
    h.ctx.rollback_transaction().await.unwrap();
    assert!(h.guests.find_by_id(discarded.id).await.unwrap().is_none());

    h.ctx.begin_transaction().await.unwrap();
    let kept = h.guests.create(&guest("kept@example.com")).await.unwrap();
    h.ctx.commit_transaction().await.unwrap();

    let stored = h.guests.find_by_email("kept@example.com").await.unwrap().unwrap();
    assert_eq!(stored.id, kept.id);
}

#[tokio::test]
async fn test_storage_rejects_overlap_even_without_service_check() {
    let app = TestApp::new().await;
    let h = harness(&app);
    let g = h.guests.create(&guest("race@example.com")).await.unwrap();
    let r = room(1, "101", 100.0);

    let make = |from: i64, to: i64| Booking::new(NewBookingParams {
        guest_id: g.id,
        room: &r,
        check_in: days_from_today(from),
        check_out: days_from_today(to),
        quote: StayQuote { nights: to - from, total_amount: (to - from) as f64 * 100.0 },
    });

    h.bookings.create(&make(10, 14)).await.unwrap();
    let err = h.bookings.create(&make(12, 16)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let mut cancelled = h.bookings.create(&make(20, 22)).await.unwrap();
    cancelled.transition(BookingStatus::Cancelled).unwrap();
    h.bookings.update(&cancelled).await.unwrap();
    h.bookings.create(&make(20, 22)).await.unwrap();
}

#[tokio::test]
async fn test_service_create_with_external_rooms() {
    let app = TestApp::new().await;
    let h = harness(&app);
    let g = h.guests.create(&guest("alice@example.com")).await.unwrap();

    let details = h.service.create(CreateBookingCommand {
        room_id: 1,
        guest_id: g.id,
        check_in_date: days_from_today(10),
        check_out_date: days_from_today(13),
    }).await.unwrap();

    assert_eq!(details.booking.number_of_nights, 3);
    assert_eq!(details.booking.total_amount, 300.0);
    assert_eq!(details.booking.status, BookingStatus::Pending);
    assert_eq!(details.guest_email, "alice@example.com");
    assert!(!h.ctx.in_transaction().await);

    let err = h.service.create(CreateBookingCommand {
        room_id: 3,
        guest_id: g.id,
        check_in_date: days_from_today(10),
        check_out_date: days_from_today(13),
    }).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!h.ctx.in_transaction().await);
}

#[tokio::test]
async fn test_failed_update_leaves_booking_unchanged() {
    let app = TestApp::new().await;
    let h = harness(&app);
    let g = h.guests.create(&guest("bob@example.com")).await.unwrap();

    let first = h.service.create(CreateBookingCommand {
        room_id: 1, guest_id: g.id, check_in_date: days_from_today(5), check_out_date: days_from_today(8),
    }).await.unwrap();
    h.service.create(CreateBookingCommand {
        room_id: 2, guest_id: g.id, check_in_date: days_from_today(5), check_out_date: days_from_today(8),
    }).await.unwrap();

    let err = h.service.update(first.booking.id, UpdateBookingCommand {
        room_id: Some(2),
        ..Default::default()
    }).await.unwrap_err();
    match err {
        AppError::Conflict(msg) => assert!(msg.starts_with("Room 102 is not available"), "{msg}"),
        other => panic!("expected conflict, got {other:?}"),
    }

    let reloaded = h.service.get(first.booking.id).await.unwrap();
    assert_eq!(reloaded.booking.room_id, 1);
    assert_eq!(reloaded.booking.total_amount, 300.0);
    assert_eq!(reloaded.booking.updated_at, first.booking.updated_at);
}

#[tokio::test]
async fn test_confirm_twice_fails_without_side_effects() {
    let app = TestApp::new().await;
    let h = harness(&app);
    let g = h.guests.create(&guest("carol@example.com")).await.unwrap();

    let created = h.service.create(CreateBookingCommand {
        room_id: 1, guest_id: g.id, check_in_date: days_from_today(1), check_out_date: days_from_today(2),
    }).await.unwrap();

    let confirmed = h.service.confirm(created.booking.id).await.unwrap();
    assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);

    let err = h.service.confirm(created.booking.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus { status: BookingStatus::Confirmed, .. }));

    let after = h.service.get(created.booking.id).await.unwrap();
    assert_eq!(after.booking.status, BookingStatus::Confirmed);
    assert_eq!(after.booking.updated_at, confirmed.booking.updated_at);
    assert!(Utc::now() >= after.booking.updated_at);
}

#[tokio::test]
async fn test_concurrent_create_loser_gets_conflict() {
    let app = TestApp::new().await;
    let first = harness(&app);
    let second = harness(&app);
    let g = first.guests.create(&guest("dave@example.com")).await.unwrap();
    let (check_in, check_out) = (days_from_today(5), days_from_today(8));

    let stay = move |guest_id: i64| {
        let r = room(1, "101", 100.0);
        Booking::new(NewBookingParams {
            guest_id,
            room: &r,
            check_in,
            check_out,
            quote: StayQuote { nights: 3, total_amount: 300.0 },
        })
    };

    first.ctx.begin_transaction().await.unwrap();
    assert!(first.bookings.is_room_available(1, check_in, check_out, None).await.unwrap());
    first.bookings.create(&stay(g.id)).await.unwrap();

    // The second writer blocks at BEGIN until the first one commits.
    let guest_id = g.id;
    let racer = tokio::spawn(async move {
        second.ctx.begin_transaction().await.unwrap();
        let available = second.bookings.is_room_available(1, check_in, check_out, None).await.unwrap();
        let written = second.bookings.create(&stay(guest_id)).await;
        second.ctx.rollback_transaction().await.unwrap();
        (available, written, second)
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    first.ctx.commit_transaction().await.unwrap();

    let (available, written, second) = racer.await.unwrap();
    assert!(!available);
    assert!(matches!(written, Err(AppError::Conflict(_))), "{written:?}");

    let err = second.service.create(CreateBookingCommand {
        room_id: 1, guest_id, check_in_date: check_in, check_out_date: check_out,
    }).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
    assert_eq!(first.bookings.list_by_room(1).await.unwrap().len(), 1);
}
