use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - service banner and route map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Campus Portal API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "public_auth": "/auth/register, /auth/login, /auth/refresh (public)",
                "storage": "/storage/* (public blobs)",
                "auth": "/api/auth/whoami, /api/auth/session (protected)",
                "sessions": "/api/sessions[/:id[/calendar.ics]] (protected)",
                "calendar": "/api/calendar.ics (protected)",
                "data": "/api/data/:table[/:id] (protected)",
                "find": "/api/find/:table[/count] (protected)",
                "partners": "/api/partners/matches (protected)",
                "notifications": "/api/notifications/* (protected)",
                "admin": "/api/admin/* (admin only)",
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}
