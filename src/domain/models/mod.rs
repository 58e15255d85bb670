pub mod auth;
pub mod booking;
pub mod guest;
pub mod pagination;
pub mod room;
pub mod user;
