// handlers/elevated/mod.rs - admin dashboard
//
// Routed behind jwt_auth_middleware and then require_admin.
pub mod admin;
