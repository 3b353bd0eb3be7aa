use axum::{extract::Path, Extension};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::NotificationService;

/// POST /api/notifications/:id/read
pub async fn mark_read(Path(id): Path<Uuid>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    if !NotificationService::new()?.mark_read(user.user_id, id, Utc::now()).await? {
        return Err(ApiError::not_found(format!("Notification {} not found", id)));
    }
    Ok(ApiResponse::success(json!({ "id": id, "read": true })))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let updated = NotificationService::new()?.mark_all_read(user.user_id, Utc::now()).await?;
    Ok(ApiResponse::success(json!({ "updated": updated })))
}
