use std::sync::Arc;
use sqlx::SqlitePool;
use crate::config::Config;
use crate::domain::ports::{BookingRepository, GuestRepository, RoomCatalog, RoomRepository, UnitOfWork, UserRepository};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::booking_service::BookingService;
use crate::infra::context::SqliteContext;
use crate::infra::repositories::{
    sqlite_booking_repo::SqliteBookingRepo, sqlite_guest_repo::SqliteGuestRepo,
    sqlite_room_repo::SqliteRoomRepo,
};
use crate::infra::rooms::local_room_catalog::LocalRoomCatalog;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pool: SqlitePool,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_service: Arc<AuthService>,
    /// Remote room lookup; `None` serves rooms from the local table.
    pub room_service: Option<Arc<dyn RoomCatalog>>,
}

/// Repositories bound to one request's database context.
pub struct RequestScope {
    pub uow: Arc<dyn UnitOfWork>,
    pub bookings: Arc<dyn BookingRepository>,
    pub guests: Arc<dyn GuestRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub room_catalog: Arc<dyn RoomCatalog>,
}

impl AppState {
    pub fn scope(&self) -> RequestScope {
        let ctx = Arc::new(SqliteContext::new(self.pool.clone()));
        let rooms: Arc<dyn RoomRepository> = Arc::new(SqliteRoomRepo::new(ctx.clone()));
        let room_catalog = match &self.room_service {
            Some(remote) => remote.clone(),
            None => Arc::new(LocalRoomCatalog::new(rooms.clone())) as Arc<dyn RoomCatalog>,
        };

        RequestScope {
            bookings: Arc::new(SqliteBookingRepo::new(ctx.clone())),
            guests: Arc::new(SqliteGuestRepo::new(ctx.clone())),
            rooms,
            room_catalog,
            uow: ctx,
        }
    }

    pub fn booking_service(&self) -> BookingService {
        let scope = self.scope();
        BookingService::new(scope.uow, scope.bookings, scope.guests, scope.room_catalog)
    }
}
