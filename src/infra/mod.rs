pub mod context;
pub mod factory;
pub mod repositories;
pub mod rooms;
