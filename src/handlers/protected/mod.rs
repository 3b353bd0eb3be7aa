// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Every handler here receives the caller as `Extension<AuthUser>`.
pub mod auth;
pub mod calendar;
pub mod data;
pub mod find;
pub mod notifications;
pub mod partners;
pub mod sessions;
pub mod storage;
