pub mod auth;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod partners;
pub mod server;
pub mod services;
pub mod sessions;
pub mod storage;
