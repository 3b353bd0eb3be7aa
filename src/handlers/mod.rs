// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) → Protected (JWT auth) → Elevated (JWT auth + admin gate)
pub mod public;    // /, /health, /auth/*
pub mod protected; // /api/*
pub mod elevated;  // /api/admin/*
