// handlers/protected/sessions.rs - shared study sessions with derived status
use axum::{
    extract::{Path, Query},
    response::Response,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::calendar::ics_response;
use crate::calendar::{session_event, Calendar};
use crate::config;
use crate::error::ApiError;
use crate::middleware::{is_admin, ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::SessionService;
use crate::sessions::{build_listing, plan_session, CreateSessionRequest, SessionStatus, SessionView};

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub course_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
}

/// GET /api/sessions - live first, then upcoming, then ended
pub async fn list(Query(query): Query<SessionQuery>) -> ApiResult<Vec<SessionView>> {
    let now = Utc::now();
    let session_config = &config::config().sessions;
    let sessions = SessionService::new()?.list(query.course_id, now, session_config).await?;
    let listing = build_listing(sessions, now, query.status, session_config);
    Ok(ApiResponse::success(listing))
}

/// POST /api/sessions
pub async fn create(
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateSessionRequest>,
) -> ApiResult<SessionView> {
    let now = Utc::now();
    let session_config = &config::config().sessions;
    let planned = plan_session(request, now, session_config)
        .map_err(|fields| ApiError::validation_error("Invalid session", Some(fields)))?;

    let session = SessionService::new()?.create(user.user_id, &planned).await?;
    Ok(ApiResponse::created(SessionView::new(session, now, session_config)))
}

/// GET /api/sessions/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<SessionView> {
    let session = SessionService::new()?.get(id).await?;
    Ok(ApiResponse::success(SessionView::new(session, Utc::now(), &config::config().sessions)))
}

/// DELETE /api/sessions/:id - host or admin only
pub async fn delete(Path(id): Path<Uuid>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let service = SessionService::new()?;
    let session = service.get(id).await?;

    if session.host_id != user.user_id && !is_admin(&user).await? {
        return Err(ApiError::forbidden("Only the host can end this session"));
    }

    service.delete(id).await?;
    tracing::info!("Session {} deleted by {}", id, user.user_id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

/// GET /api/sessions/:id/calendar.ics
pub async fn calendar(Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let session = SessionService::new()?.get(id).await?;
    let app = config::config();

    let mut calendar = Calendar::new(app.calendar.product_id.clone(), Utc::now());
    calendar.push(session_event(&session, &app.sessions));
    ics_response(&calendar, &format!("session-{}.ics", session.id))
}
