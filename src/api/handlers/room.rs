use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{CreateRoomRequest, UpdateRoomRequest};
use crate::api::dtos::responses::{ApiResponse, PagedResponse};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::booking::BookingStatus;
use crate::domain::models::room::{NewRoomParams, Room, RoomFilter};
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RoomFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.scope().rooms.list_filtered(&filter).await?;
    Ok(Json(PagedResponse::from_page(page, "Rooms retrieved")))
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let room = state.scope().rooms.find_by_id(room_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room_id)))?;
    Ok(Json(ApiResponse::success(room, "Room retrieved")))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;

    let rooms = state.scope().rooms;
    let room_number = payload.room_number.trim().to_string();
    if rooms.find_by_number(&room_number).await?.is_some() {
        return Err(AppError::Conflict(format!("Room number {} already exists", room_number)));
    }

    let room = rooms.create(&Room::new(NewRoomParams {
        room_number,
        room_type: payload.room_type.trim().to_string(),
        price_per_night: payload.price_per_night,
        capacity: payload.capacity,
        is_available: payload.is_available.unwrap_or(true),
        description: payload.description,
    })).await?;

    info!(room_id = room.id, "Room {} created", room.room_number);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(room, "Room created"))))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(room_id): Path<i64>,
    Json(payload): Json<UpdateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;

    let rooms = state.scope().rooms;
    let mut room = rooms.find_by_id(room_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room_id)))?;

    if let Some(number) = payload.room_number.map(|n| n.trim().to_string())
        && number != room.room_number {
        if rooms.find_by_number(&number).await?.is_some() {
            return Err(AppError::Conflict(format!("Room number {} already exists", number)));
        }
        room.room_number = number;
    }
    if let Some(room_type) = payload.room_type { room.room_type = room_type.trim().to_string(); }
    if let Some(price) = payload.price_per_night { room.price_per_night = price; }
    if let Some(capacity) = payload.capacity { room.capacity = capacity; }
    if let Some(available) = payload.is_available { room.is_available = available; }
    if payload.description.is_some() { room.description = payload.description; }
    room.updated_at = Utc::now();

    let updated = rooms.update(&room).await?;
    info!(room_id, "Room updated");
    Ok(Json(ApiResponse::success(updated, "Room updated")))
}

pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(room_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;

    let scope = state.scope();
    let open_bookings = scope.bookings.list_by_room(room_id).await?
        .into_iter()
        .filter(|b| !matches!(b.booking.status, BookingStatus::Cancelled | BookingStatus::CheckedOut))
        .count();
    if open_bookings > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete room {}: it has {} open booking(s)", room_id, open_bookings
        )));
    }

    scope.rooms.delete(room_id).await?;
    info!(room_id, "Room deleted");
    Ok(Json(ApiResponse::ok("Room deleted")))
}
