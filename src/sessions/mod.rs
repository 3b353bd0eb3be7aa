pub mod status;

pub use status::{sort_by_status, status_at, SessionStatus, SessionTiming};

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::database::models::SharedSession;

/// Body of `POST /api/sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub course_id: Option<Uuid>,
    pub description: Option<String>,
    pub meeting_link: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_utc")]
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub estimated_duration: Option<i32>,
}

/// RFC 3339 timestamps, or `YYYY-MM-DDTHH:MM:SS[.fff]` without an offset,
/// which is read as UTC.
pub fn parse_utc(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("invalid timestamp '{}'", raw))
}

fn deserialize_optional_utc<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_utc(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

/// A validated session ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSession {
    pub title: String,
    pub course_id: Option<Uuid>,
    pub description: Option<String>,
    pub meeting_link: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub estimated_duration: Option<i32>,
    pub expires_at: DateTime<Utc>,
}

/// Session row plus its derived status, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: SharedSession,
    pub status: SessionStatus,
    pub ends_at: DateTime<Utc>,
}

impl SessionView {
    pub fn new(session: SharedSession, now: DateTime<Utc>, config: &SessionConfig) -> Self {
        let timing = SessionTiming::from(&session);
        Self {
            status: timing.status_at(now, config.default_duration_minutes),
            ends_at: timing.effective_end(config.default_duration_minutes),
            session,
        }
    }
}

/// Build the API listing: derive statuses, keep those matching `only`, sort.
pub fn build_listing(
    sessions: Vec<SharedSession>,
    now: DateTime<Utc>,
    only: Option<SessionStatus>,
    config: &SessionConfig,
) -> Vec<SessionView> {
    let mut views: Vec<SessionView> = sessions
        .into_iter()
        .map(|s| SessionView::new(s, now, config))
        .filter(|v| only.map_or(true, |status| v.status == status))
        .collect();
    sort_by_status(&mut views, now, config.default_duration_minutes, |v| {
        SessionTiming::from(&v.session)
    });
    views
}

/// Validate a create request and compute its expiry.
pub fn plan_session(
    request: CreateSessionRequest,
    now: DateTime<Utc>,
    config: &SessionConfig,
) -> Result<PlannedSession, HashMap<String, String>> {
    let mut errors = HashMap::new();

    let title = request.title.trim().to_string();
    if title.is_empty() {
        errors.insert("title".to_string(), "Title is required".to_string());
    }

    let meeting_link = request
        .meeting_link
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    if let Some(link) = &meeting_link {
        if !crate::calendar::is_web_url(link) {
            errors.insert(
                "meeting_link".to_string(),
                "Meeting link must be an absolute http(s) URL".to_string(),
            );
        }
    }

    if let Some(minutes) = request.estimated_duration {
        if minutes < 1 || i64::from(minutes) > config.max_duration_minutes {
            errors.insert(
                "estimated_duration".to_string(),
                format!("Duration must be between 1 and {} minutes", config.max_duration_minutes),
            );
        }
    }

    if let Some(start) = request.scheduled_start_time {
        if start < now {
            errors.insert(
                "scheduled_start_time".to_string(),
                "Scheduled start cannot be in the past".to_string(),
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let expires_at = match request.scheduled_start_time {
        Some(start) => {
            let minutes = request
                .estimated_duration
                .map(i64::from)
                .unwrap_or(config.default_duration_minutes);
            start + Duration::minutes(minutes)
        }
        None => now + Duration::minutes(config.adhoc_ttl_minutes),
    };

    Ok(PlannedSession {
        title,
        course_id: request.course_id,
        description: request.description.filter(|d| !d.trim().is_empty()),
        meeting_link,
        scheduled_start_time: request.scheduled_start_time,
        estimated_duration: request.estimated_duration,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn request() -> CreateSessionRequest {
        CreateSessionRequest {
            title: "Linear algebra review".to_string(),
            course_id: None,
            description: None,
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            scheduled_start_time: None,
            estimated_duration: None,
        }
    }

    fn session(title: &str, start: Option<DateTime<Utc>>, expires: DateTime<Utc>) -> SharedSession {
        SharedSession {
            id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            course_id: None,
            title: title.to_string(),
            description: None,
            meeting_link: None,
            scheduled_start_time: start,
            estimated_duration: Some(60),
            expires_at: expires,
            created_at: now() - Duration::hours(3),
        }
    }

    #[test]
    fn adhoc_session_expires_after_ttl() {
        let planned = plan_session(request(), now(), &SessionConfig::default()).unwrap();
        assert_eq!(planned.expires_at, now() + Duration::minutes(120));
        assert!(planned.scheduled_start_time.is_none());
    }

    #[test]
    fn scheduled_session_expires_at_end_of_window() {
        let mut req = request();
        req.scheduled_start_time = Some(now() + Duration::hours(1));
        req.estimated_duration = Some(45);
        let planned = plan_session(req, now(), &SessionConfig::default()).unwrap();
        assert_eq!(planned.expires_at, now() + Duration::minutes(105));
    }

    #[test]
    fn rejects_bad_input_with_field_errors() {
        let req = CreateSessionRequest {
            title: "   ".to_string(),
            meeting_link: Some("javascript:alert(1)".to_string()),
            estimated_duration: Some(0),
            scheduled_start_time: Some(now() - Duration::minutes(5)),
            ..request()
        };
        let errors = plan_session(req, now(), &SessionConfig::default()).unwrap_err();
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("meeting_link"));
        assert!(errors.contains_key("estimated_duration"));
        assert!(errors.contains_key("scheduled_start_time"));
    }

    #[test]
    fn rejects_links_with_embedded_line_breaks() {
        let req = CreateSessionRequest {
            meeting_link: Some("https://x\r\nEND:VEVENT\r\nBEGIN:VEVENT".to_string()),
            ..request()
        };
        let errors = plan_session(req, now(), &SessionConfig::default()).unwrap_err();
        assert!(errors.contains_key("meeting_link"));
    }

    #[test]
    fn start_time_accepts_offsets_and_naive_utc() {
        let with_offset: CreateSessionRequest = serde_json::from_value(serde_json::json!({
            "title": "x",
            "scheduled_start_time": "2025-03-10T12:00:00+02:00"
        }))
        .unwrap();
        let naive: CreateSessionRequest = serde_json::from_value(serde_json::json!({
            "title": "x",
            "scheduled_start_time": "2025-03-10T10:00:00"
        }))
        .unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
        assert_eq!(with_offset.scheduled_start_time, Some(expected));
        assert_eq!(naive.scheduled_start_time, Some(expected));

        let missing: CreateSessionRequest = serde_json::from_value(serde_json::json!({ "title": "x" })).unwrap();
        assert_eq!(missing.scheduled_start_time, None);
        assert_eq!(parse_utc("2025-03-10T10:00:00.250").unwrap().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn malformed_start_time_fails_deserialization() {
        let result = serde_json::from_value::<CreateSessionRequest>(serde_json::json!({
            "title": "x",
            "scheduled_start_time": "garbage"
        }));
        assert!(result.unwrap_err().to_string().contains("invalid timestamp 'garbage'"));
    }

    #[test]
    fn listing_filters_and_orders() {
        let config = SessionConfig::default();
        let sessions = vec![
            session("old", Some(now() - Duration::hours(5)), now() - Duration::hours(4)),
            session("later", Some(now() + Duration::hours(2)), now() + Duration::hours(3)),
            session("now", None, now() + Duration::hours(1)),
        ];

        let all = build_listing(sessions.clone(), now(), None, &config);
        let titles: Vec<&str> = all.iter().map(|v| v.session.title.as_str()).collect();
        assert_eq!(titles, vec!["now", "later", "old"]);

        let upcoming = build_listing(sessions, now(), Some(SessionStatus::Upcoming), &config);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].session.title, "later");
    }
}
