// handlers/public/mod.rs - endpoints reachable without a token
//
// Token acquisition lives here, so every input is untrusted.
pub mod auth;
pub mod root;
