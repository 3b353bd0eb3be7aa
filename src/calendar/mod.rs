pub mod ics;

pub use ics::{is_web_url, Calendar, CalendarError, CalendarEvent};

use chrono::{DateTime, Duration, Utc};

use crate::config::{CalendarConfig, SessionConfig};
use crate::database::models::{Assignment, Exam, SharedSession};
use crate::sessions::{SessionStatus, SessionTiming};

/// Domain suffix for generated UIDs so they stay globally unique.
const UID_DOMAIN: &str = "campus-portal";

pub fn session_event(session: &SharedSession, sessions: &SessionConfig) -> CalendarEvent {
    let timing = SessionTiming::from(session);
    CalendarEvent::new(
        format!("session-{}@{}", session.id, UID_DOMAIN),
        session.title.clone(),
        timing.effective_start(),
        timing.effective_end(sessions.default_duration_minutes),
    )
    .with_description(session.description.clone())
    .with_url(session.meeting_link.clone())
}

pub fn exam_event(exam: &Exam, calendar: &CalendarConfig) -> CalendarEvent {
    let minutes = exam
        .duration_minutes
        .map(i64::from)
        .filter(|m| *m > 0)
        .unwrap_or(calendar.exam_duration_minutes);
    CalendarEvent::new(
        format!("exam-{}@{}", exam.id, UID_DOMAIN),
        format!("Exam: {}", exam.title),
        exam.exam_date,
        exam.exam_date + Duration::minutes(minutes),
    )
    .with_description(exam.notes.clone())
    .with_location(exam.location.clone())
}

/// Assignments are rendered as a work block ending at the due time.
pub fn assignment_event(assignment: &Assignment, calendar: &CalendarConfig) -> CalendarEvent {
    CalendarEvent::new(
        format!("assignment-{}@{}", assignment.id, UID_DOMAIN),
        format!("Due: {}", assignment.title),
        assignment.due_date - Duration::minutes(calendar.assignment_block_minutes),
        assignment.due_date,
    )
    .with_description(assignment.notes.clone())
}

/// Everything on a student's plate: exams, assignments and the sessions
/// that have not ended yet. Rows that cannot be rendered are left out so one
/// bad record does not cost the whole feed.
pub fn personal_feed(
    sessions: &[SharedSession],
    exams: &[Exam],
    assignments: &[Assignment],
    now: DateTime<Utc>,
    calendar: &CalendarConfig,
    session_config: &SessionConfig,
) -> Calendar {
    let live_or_upcoming = sessions
        .iter()
        .filter(|s| {
            SessionTiming::from(*s).status_at(now, session_config.default_duration_minutes) != SessionStatus::Ended
        })
        .map(|s| session_event(s, session_config));
    let events = live_or_upcoming
        .chain(exams.iter().map(|e| exam_event(e, calendar)))
        .chain(assignments.iter().map(|a| assignment_event(a, calendar)))
        .filter(|event| match event.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Leaving {} out of calendar feed: {}", event.uid, e);
                false
            }
        });

    let mut feed = Calendar::new(calendar.product_id.clone(), now);
    feed.extend(events);
    feed
}
