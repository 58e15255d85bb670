use crate::domain::models::{
    auth::RefreshTokenRecord,
    booking::{Booking, BookingDetails, BookingFilter},
    guest::{Guest, GuestFilter},
    pagination::Page,
    room::{Room, RoomFilter},
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Transaction boundary spanning one logical operation.
///
/// At most one transaction is active per instance. Commit and rollback always
/// release the transaction handle and are no-ops when nothing is active.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin_transaction(&self) -> Result<(), AppError>;
    /// Returns the number of rows written since the previous call.
    async fn save_changes(&self) -> Result<u64, AppError>;
    async fn commit_transaction(&self) -> Result<(), AppError>;
    async fn rollback_transaction(&self) -> Result<(), AppError>;
    async fn in_transaction(&self) -> bool;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, AppError>;
    async fn find_details(&self, id: i64) -> Result<Option<BookingDetails>, AppError>;
    async fn update(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn list_filtered(&self, filter: &BookingFilter) -> Result<Page<BookingDetails>, AppError>;
    async fn list_by_guest(&self, guest_id: i64) -> Result<Vec<BookingDetails>, AppError>;
    async fn list_by_room(&self, room_id: i64) -> Result<Vec<BookingDetails>, AppError>;
    async fn list_upcoming(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<BookingDetails>, AppError>;
    async fn list_active(&self, today: NaiveDate) -> Result<Vec<BookingDetails>, AppError>;
    async fn is_room_available(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_booking_id: Option<i64>,
    ) -> Result<bool, AppError>;
    async fn count_by_guest(&self, guest_id: i64) -> Result<i64, AppError>;
}

#[async_trait]
pub trait GuestRepository: Send + Sync {
    async fn create(&self, guest: &Guest) -> Result<Guest, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Guest>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Guest>, AppError>;
    async fn update(&self, guest: &Guest) -> Result<Guest, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn list_filtered(&self, filter: &GuestFilter) -> Result<Page<Guest>, AppError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create(&self, room: &Room) -> Result<Room, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError>;
    async fn find_by_number(&self, room_number: &str) -> Result<Option<Room>, AppError>;
    async fn update(&self, room: &Room) -> Result<Room, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn list_filtered(&self, filter: &RoomFilter) -> Result<Page<Room>, AppError>;
}

/// Room lookup used by the booking flow. Rooms may live in another service.
#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn get_room(&self, room_id: i64) -> Result<Option<Room>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn store_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    /// Revokes a live token and returns it. `None` if it is unknown or was already revoked.
    async fn consume_refresh_token(&self, token_hash: &str, at: DateTime<Utc>) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn revoke_family(&self, family_id: &str, at: DateTime<Utc>) -> Result<u64, AppError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
