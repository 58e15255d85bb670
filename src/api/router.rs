use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, booking, guest, health, room};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))

        // Rooms
        .route("/api/rooms", get(room::list_rooms).post(room::create_room))
        .route("/api/rooms/{room_id}", get(room::get_room).put(room::update_room).delete(room::delete_room))

        // Guests
        .route("/api/guests", get(guest::list_guests).post(guest::create_guest))
        .route("/api/guests/by-email", get(guest::get_guest_by_email))
        .route("/api/guests/{guest_id}", get(guest::get_guest).put(guest::update_guest).delete(guest::delete_guest))

        // Bookings
        .route("/api/bookings", get(booking::list_bookings).post(booking::create_booking))
        .route("/api/bookings/check-availability", post(booking::check_availability))
        .route("/api/bookings/upcoming", get(booking::upcoming_bookings))
        .route("/api/bookings/active", get(booking::active_bookings))
        .route("/api/bookings/guest/{guest_id}", get(booking::list_guest_bookings))
        .route("/api/bookings/room/{room_id}", get(booking::list_room_bookings))
        .route("/api/bookings/{booking_id}", get(booking::get_booking).put(booking::update_booking))

        // Booking lifecycle
        .route("/api/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/bookings/{booking_id}/confirm", post(booking::confirm_booking))
        .route("/api/bookings/{booking_id}/checkin", post(booking::check_in))
        .route("/api/bookings/{booking_id}/checkout", post(booking::check_out))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
