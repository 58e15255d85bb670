pub mod http_room_catalog;
pub mod local_room_catalog;
