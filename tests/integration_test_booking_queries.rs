mod common;

use axum::http::StatusCode;
use chrono::{Duration, SecondsFormat, Utc};
use common::{days_from_today, TestApp};

async fn seed(app: &TestApp, token: &str) -> (i64, i64, i64, i64) {
    let r1 = app.create_room(token, "101", 100.0).await;
    let r2 = app.create_room(token, "202", 200.0).await;
    let alice = app.create_guest(token, "Alice", "alice@example.com").await;
    let bob = app.create_guest(token, "Bob", "bob@example.com").await;

    for (room, guest, start) in [(r1, alice, 1), (r1, bob, 5), (r1, alice, 9), (r2, bob, 1), (r2, alice, 20), (r2, bob, 40)] {
        let (status, body) = app.create_booking(token, room, guest, days_from_today(start), days_from_today(start + 2)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }
    (r1, r2, alice, bob)
}

#[tokio::test]
async fn test_list_is_paged_with_metadata() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    seed(&app, &token).await;

    let (status, body) = app.request("GET", "/api/bookings?pageNumber=2&pageSize=4", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pageNumber"], 2);
    assert_eq!(body["pageSize"], 4);
    assert_eq!(body["totalCount"], 6);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["hasNext"], false);
    assert_eq!(body["hasPrevious"], true);

    let (_, body) = app.request("GET", "/api/bookings?pageSize=500", Some(&token), None).await;
    assert_eq!(body["pageSize"], 50);
}

#[tokio::test]
async fn test_filters_and_sorting() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (r1, _r2, alice, _bob) = seed(&app, &token).await;

    let (_, body) = app.request("GET", &format!("/api/bookings?roomId={}", r1), Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);

    let (_, body) = app.request("GET", &format!("/api/bookings?guestId={}&sortBy=checkin&sortOrder=desc", alice), Some(&token), None).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    let dates: Vec<&str> = items.iter().map(|b| b["checkInDate"].as_str().unwrap()).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);

    let (_, body) = app.request("GET", "/api/bookings?minAmount=300&sortBy=amount", Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["data"][0]["totalAmount"], 400.0);

    let (_, body) = app.request("GET", "/api/bookings?searchTerm=bob", Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);

    let (_, body) = app.request("GET", "/api/bookings?searchTerm=202", Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);

    let (_, body) = app.request(
        "GET",
        &format!("/api/bookings?checkInFrom={}&checkInTo={}", days_from_today(2), days_from_today(10)),
        Some(&token),
        None,
    ).await;
    assert_eq!(body["totalCount"], 2);

    let (_, body) = app.request("GET", "/api/bookings?status=pending", Some(&token), None).await;
    assert_eq!(body["totalCount"], 6);
    let (_, body) = app.request("GET", "/api/bookings?status=Cancelled", Some(&token), None).await;
    assert_eq!(body["totalCount"], 0);
}

#[tokio::test]
async fn test_amount_range_with_guest_name_sort() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    seed(&app, &token).await;

    let (_, body) = app.request("GET", "/api/bookings?minAmount=150&maxAmount=250", Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);
    assert!(body["data"].as_array().unwrap().iter().all(|b| b["totalAmount"] == 200.0));

    let (_, body) = app.request("GET", "/api/bookings?maxAmount=199.99", Some(&token), None).await;
    assert_eq!(body["totalCount"], 0);

    let (_, body) = app.request("GET", "/api/bookings?minAmount=400&maxAmount=400&sortBy=guestname", Some(&token), None).await;
    let names: Vec<&str> = body["data"].as_array().unwrap().iter()
        .map(|b| b["guestFirstName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob", "Bob"]);

    let (_, body) = app.request("GET", "/api/bookings?minAmount=400&sortBy=guestName&sortOrder=desc", Some(&token), None).await;
    assert_eq!(body["data"][0]["guestFirstName"], "Bob");
    assert_eq!(body["data"][2]["guestFirstName"], "Alice");
}

#[tokio::test]
async fn test_created_at_range() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (r1, _r2, _alice, _bob) = seed(&app, &token).await;

    // Backdate the first room's bookings so the two batches sit on either side of a cutoff.
    sqlx::query("UPDATE bookings SET created_at = ? WHERE room_id = ?")
        .bind(Utc::now() - Duration::days(10))
        .bind(r1)
        .execute(&app.pool).await.unwrap();

    let at = |days: i64| (Utc::now() + Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true);

    let (status, body) = app.request("GET", &format!("/api/bookings?createdTo={}", at(-5)), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["totalCount"], 3);
    assert!(body["data"].as_array().unwrap().iter().all(|b| b["roomId"] == r1));

    let (_, body) = app.request("GET", &format!("/api/bookings?createdFrom={}", at(-5)), Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);
    assert!(body["data"].as_array().unwrap().iter().all(|b| b["roomId"] != r1));

    let (_, body) = app.request("GET", &format!("/api/bookings?createdFrom={}&createdTo={}", at(-11), at(-9)), Some(&token), None).await;
    assert_eq!(body["totalCount"], 3);

    let (_, body) = app.request("GET", &format!("/api/bookings?createdFrom={}", at(1)), Some(&token), None).await;
    assert_eq!(body["totalCount"], 0);
}

#[tokio::test]
async fn test_guest_and_room_booking_lists() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let (_r1, r2, _alice, bob) = seed(&app, &token).await;

    let (status, body) = app.request("GET", &format!("/api/bookings/guest/{}", bob), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = app.request("GET", "/api/bookings/guest/9999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = app.request("GET", &format!("/api/bookings/room/{}", r2), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_upcoming_window_excludes_cancelled() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    seed(&app, &token).await;

    let (status, body) = app.request("GET", "/api/bookings/upcoming?days=7", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let upcoming = body["data"].as_array().unwrap();
    assert_eq!(upcoming.len(), 3);

    let id = upcoming[0]["id"].as_i64().unwrap();
    app.request("POST", &format!("/api/bookings/{}/cancel", id), Some(&token), None).await;

    let (_, body) = app.request("GET", "/api/bookings/upcoming", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.request("GET", "/api/bookings/upcoming?days=365", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let (status, _) = app.request("GET", "/api/bookings/upcoming?days=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.request("GET", "/api/bookings/upcoming?days=366", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
