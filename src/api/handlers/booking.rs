use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{CancelBookingRequest, CheckAvailabilityRequest, UpcomingQuery};
use crate::api::dtos::responses::{ApiResponse, PagedResponse};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::booking::BookingFilter;
use crate::domain::services::booking_service::{CreateBookingCommand, UpdateBookingCommand};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(filter): Query<BookingFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.booking_service().list(&filter).await?;
    Ok(Json(PagedResponse::from_page(page, "Bookings retrieved")))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service().get(booking_id).await?;
    Ok(Json(ApiResponse::success(booking, "Booking retrieved")))
}

pub async fn list_guest_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(guest_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service().list_by_guest(guest_id).await?;
    Ok(Json(ApiResponse::success(bookings, "Guest bookings retrieved")))
}

pub async fn list_room_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service().list_by_room(room_id).await?;
    Ok(Json(ApiResponse::success(bookings, "Room bookings retrieved")))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateBookingCommand>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service().create(payload).await?;
    info!(booking_id = booking.booking.id, created_by = %claims.username, "Booking created for {}", booking.guest_name());
    Ok((StatusCode::CREATED, Json(ApiResponse::success(booking, "Booking created successfully"))))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<i64>,
    Json(payload): Json<UpdateBookingCommand>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service().update(booking_id, payload).await?;
    Ok(Json(ApiResponse::success(booking, "Booking updated successfully")))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<i64>,
    payload: Option<Json<CancelBookingRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let booking = state.booking_service().cancel(booking_id, reason).await?;
    Ok(Json(ApiResponse::success(booking, "Booking cancelled successfully")))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service().confirm(booking_id).await?;
    Ok(Json(ApiResponse::success(booking, "Booking confirmed successfully")))
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service().check_in(booking_id).await?;
    Ok(Json(ApiResponse::success(booking, "Guest checked in successfully")))
}

pub async fn check_out(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service().check_out(booking_id).await?;
    Ok(Json(ApiResponse::success(booking, "Guest checked out successfully")))
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<CheckAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.booking_service()
        .check_availability(payload.room_id, payload.check_in_date, payload.check_out_date)
        .await?;
    let message = result.message.clone();
    Ok(Json(ApiResponse::success(result, message)))
}

pub async fn upcoming_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<UpcomingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service().upcoming(query.days.unwrap_or(7)).await?;
    Ok(Json(ApiResponse::success(bookings, "Upcoming bookings retrieved")))
}

pub async fn active_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service().active().await?;
    Ok(Json(ApiResponse::success(bookings, "Active bookings retrieved")))
}
