pub mod sqlite_auth_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_guest_repo;
pub mod sqlite_room_repo;
pub mod sqlite_user_repo;
