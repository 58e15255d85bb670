use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{CreateGuestRequest, GuestEmailQuery, UpdateGuestRequest};
use crate::api::dtos::responses::{ApiResponse, PagedResponse};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::guest::{Guest, GuestFilter, NewGuestParams};
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(filter): Query<GuestFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.scope().guests.list_filtered(&filter).await?;
    Ok(Json(PagedResponse::from_page(page, "Guests retrieved")))
}

pub async fn get_guest(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(guest_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let guest = state.scope().guests.find_by_id(guest_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Guest with id {} not found", guest_id)))?;
    Ok(Json(ApiResponse::success(guest, "Guest retrieved")))
}

pub async fn get_guest_by_email(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<GuestEmailQuery>,
) -> Result<impl IntoResponse, AppError> {
    let guest = state.scope().guests.find_by_email(&query.email).await?
        .ok_or_else(|| AppError::NotFound(format!("Guest with email {} not found", query.email)))?;
    Ok(Json(ApiResponse::success(guest, "Guest retrieved")))
}

pub async fn create_guest(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<CreateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let guests = state.scope().guests;
    if guests.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict(format!("A guest with email {} already exists", payload.email)));
    }

    let guest = guests.create(&Guest::new(NewGuestParams {
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        date_of_birth: payload.date_of_birth,
    })).await?;

    info!(guest_id = guest.id, "Guest created: {}", guest.full_name());
    Ok((StatusCode::CREATED, Json(ApiResponse::success(guest, "Guest created"))))
}

pub async fn update_guest(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(guest_id): Path<i64>,
    Json(payload): Json<UpdateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let guests = state.scope().guests;
    let mut guest = guests.find_by_id(guest_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Guest with id {} not found", guest_id)))?;

    if let Some(email) = payload.email.map(|e| e.trim().to_lowercase())
        && email != guest.email {
        if guests.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("A guest with email {} already exists", email)));
        }
        guest.email = email;
    }
    if let Some(first) = payload.first_name { guest.first_name = first.trim().to_string(); }
    if let Some(last) = payload.last_name { guest.last_name = last.trim().to_string(); }
    if let Some(phone) = payload.phone { guest.phone = phone; }
    if payload.address.is_some() { guest.address = payload.address; }
    if payload.date_of_birth.is_some() { guest.date_of_birth = payload.date_of_birth; }
    guest.updated_at = Utc::now();

    let updated = guests.update(&guest).await?;
    info!(guest_id, "Guest updated");
    Ok(Json(ApiResponse::success(updated, "Guest updated")))
}

pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(guest_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let scope = state.scope();
    let bookings = scope.bookings.count_by_guest(guest_id).await?;
    if bookings > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete guest {}: {} booking(s) reference this guest", guest_id, bookings
        )));
    }

    scope.guests.delete(guest_id).await?;
    info!(guest_id, "Guest deleted");
    Ok(Json(ApiResponse::ok("Guest deleted")))
}
