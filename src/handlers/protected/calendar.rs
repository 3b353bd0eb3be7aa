use axum::{
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;

use crate::calendar::{personal_feed, Calendar};
use crate::config;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{SessionService, TrackingService};

/// Render a calendar as a downloadable `.ics` attachment
pub fn ics_response(calendar: &Calendar, filename: &str) -> Result<Response, ApiError> {
    let body = calendar.to_ics()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response())
}

/// GET /api/calendar.ics - the caller's exams, assignments and hosted sessions
pub async fn export(Extension(user): Extension<AuthUser>) -> Result<Response, ApiError> {
    let tracking = TrackingService::new()?;
    let exams = tracking.exams(user.user_id).await?;
    let assignments = tracking.assignments(user.user_id).await?;
    let sessions = SessionService::new()?.hosted_by(user.user_id).await?;

    let app = config::config();
    let feed = personal_feed(&sessions, &exams, &assignments, Utc::now(), &app.calendar, &app.sessions);
    tracing::debug!("Exporting {} calendar events for {}", feed.len(), user.user_id);
    ics_response(&feed, "campus-calendar.ics")
}
