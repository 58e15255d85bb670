pub mod auth;
pub mod booking;
pub mod guest;
pub mod health;
pub mod room;
