use std::sync::Arc;
use crate::domain::models::room::Room;
use crate::domain::ports::{RoomCatalog, RoomRepository};
use crate::error::AppError;
use async_trait::async_trait;

/// Serves room lookups from this process's own `rooms` table.
pub struct LocalRoomCatalog {
    rooms: Arc<dyn RoomRepository>,
}

impl LocalRoomCatalog {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl RoomCatalog for LocalRoomCatalog {
    async fn get_room(&self, room_id: i64) -> Result<Option<Room>, AppError> {
        self.rooms.find_by_id(room_id).await
    }
}
