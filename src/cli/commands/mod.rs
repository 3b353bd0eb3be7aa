pub mod auth;
pub mod calendar;
pub mod data;
pub mod server;
pub mod sessions;
