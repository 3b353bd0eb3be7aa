use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::database::models::SharedSession;

/// Lifecycle of a shared study session as seen at a given instant.
///
/// Variants are declared in display order: live sessions sort first,
/// then upcoming, then ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Live,
    Upcoming,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Live => "live",
            SessionStatus::Upcoming => "upcoming",
            SessionStatus::Ended => "ended",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(SessionStatus::Live),
            "upcoming" => Ok(SessionStatus::Upcoming),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

/// The timing fields status derivation depends on.
#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub estimated_duration: Option<i32>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionTiming {
    /// Scheduled start for scheduled sessions, creation time for ad-hoc ones.
    pub fn effective_start(&self) -> DateTime<Utc> {
        self.scheduled_start_time.unwrap_or(self.created_at)
    }

    /// Instant the session stops being live.
    ///
    /// Scheduled sessions end at start + duration (falling back to
    /// `default_duration_minutes`); ad-hoc sessions end at their expiry.
    pub fn effective_end(&self, default_duration_minutes: i64) -> DateTime<Utc> {
        match self.scheduled_start_time {
            Some(start) => {
                let minutes = self
                    .estimated_duration
                    .map(i64::from)
                    .filter(|m| *m > 0)
                    .unwrap_or(default_duration_minutes);
                start + Duration::minutes(minutes)
            }
            None => self.expires_at,
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>, default_duration_minutes: i64) -> SessionStatus {
        match self.scheduled_start_time {
            None => {
                if now < self.expires_at {
                    SessionStatus::Live
                } else {
                    SessionStatus::Ended
                }
            }
            Some(start) => {
                let end = self.effective_end(default_duration_minutes);
                if now < start {
                    SessionStatus::Upcoming
                } else if now <= end {
                    SessionStatus::Live
                } else {
                    SessionStatus::Ended
                }
            }
        }
    }
}

impl From<&SharedSession> for SessionTiming {
    fn from(session: &SharedSession) -> Self {
        Self {
            scheduled_start_time: session.scheduled_start_time,
            estimated_duration: session.estimated_duration,
            expires_at: session.expires_at,
            created_at: session.created_at,
        }
    }
}

/// Derive the status of a stored session using the configured default duration.
pub fn status_at(session: &SharedSession, now: DateTime<Utc>) -> SessionStatus {
    let default_minutes = crate::config::config().sessions.default_duration_minutes;
    SessionTiming::from(session).status_at(now, default_minutes)
}

fn compare(a: &(SessionStatus, DateTime<Utc>), b: &(SessionStatus, DateTime<Utc>)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}

/// Sort sessions live → upcoming → ended, ascending by effective start within
/// each tier. The sort is stable, so ties keep their input order.
pub fn sort_by_status<T, F>(items: &mut [T], now: DateTime<Utc>, default_duration_minutes: i64, timing: F)
where
    F: Fn(&T) -> SessionTiming,
{
    items.sort_by(|a, b| {
        let ta = timing(a);
        let tb = timing(b);
        compare(
            &(ta.status_at(now, default_duration_minutes), ta.effective_start()),
            &(tb.status_at(now, default_duration_minutes), tb.effective_start()),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn scheduled(start: DateTime<Utc>, duration: Option<i32>) -> SessionTiming {
        SessionTiming {
            scheduled_start_time: Some(start),
            estimated_duration: duration,
            expires_at: start + Duration::hours(6),
            created_at: start - Duration::days(1),
        }
    }

    fn adhoc(created: DateTime<Utc>, expires: DateTime<Utc>) -> SessionTiming {
        SessionTiming {
            scheduled_start_time: None,
            estimated_duration: None,
            expires_at: expires,
            created_at: created,
        }
    }

    #[test]
    fn scheduled_session_is_live_mid_window_and_ended_after() {
        let s = scheduled(at(10, 0), Some(60));
        assert_eq!(s.status_at(at(10, 30), 60), SessionStatus::Live);
        assert_eq!(s.status_at(at(11, 1), 60), SessionStatus::Ended);
    }

    #[test]
    fn scheduled_window_bounds_are_inclusive() {
        let s = scheduled(at(10, 0), Some(60));
        assert_eq!(s.status_at(at(9, 59), 60), SessionStatus::Upcoming);
        assert_eq!(s.status_at(at(10, 0), 60), SessionStatus::Live);
        assert_eq!(s.status_at(at(11, 0), 60), SessionStatus::Live);
    }

    #[test]
    fn scheduled_without_duration_uses_default() {
        let s = scheduled(at(10, 0), None);
        assert_eq!(s.status_at(at(10, 45), 30), SessionStatus::Ended);
        assert_eq!(s.status_at(at(10, 45), 60), SessionStatus::Live);
    }

    #[test]
    fn non_positive_duration_uses_default() {
        let s = scheduled(at(10, 0), Some(-30));
        assert_eq!(s.effective_end(60), at(11, 0));
        assert_eq!(s.status_at(at(10, 45), 60), SessionStatus::Live);
        assert_eq!(scheduled(at(10, 0), Some(0)).effective_end(60), at(11, 0));
    }

    #[test]
    fn scheduled_status_ignores_expiry() {
        let mut s = scheduled(at(10, 0), Some(120));
        s.expires_at = at(10, 30);
        assert_eq!(s.status_at(at(11, 0), 60), SessionStatus::Live);
    }

    #[test]
    fn adhoc_session_live_until_expiry() {
        let s = adhoc(at(9, 0), at(11, 0));
        assert_eq!(s.status_at(at(10, 59), 60), SessionStatus::Live);
        assert_eq!(s.status_at(at(11, 0), 60), SessionStatus::Ended);
        assert_eq!(s.status_at(at(12, 0), 60), SessionStatus::Ended);
    }

    #[test]
    fn effective_start_falls_back_to_creation() {
        assert_eq!(adhoc(at(9, 0), at(11, 0)).effective_start(), at(9, 0));
        assert_eq!(scheduled(at(14, 0), None).effective_start(), at(14, 0));
    }

    #[test]
    fn sorts_live_then_upcoming_then_ended() {
        let now = at(12, 0);
        let mut sessions = vec![
            ("ended", scheduled(at(8, 0), Some(60))),
            ("upcoming-late", scheduled(at(16, 0), Some(60))),
            ("live-adhoc", adhoc(at(11, 30), at(13, 0))),
            ("upcoming-soon", scheduled(at(13, 0), Some(60))),
            ("live-scheduled", scheduled(at(11, 0), Some(120))),
            ("ended-adhoc", adhoc(at(6, 0), at(7, 0))),
        ];

        sort_by_status(&mut sessions, now, 60, |(_, t)| *t);
        let order: Vec<&str> = sessions.iter().map(|(name, _)| *name).collect();

        assert_eq!(
            order,
            vec![
                "live-scheduled",
                "live-adhoc",
                "upcoming-soon",
                "upcoming-late",
                "ended-adhoc",
                "ended",
            ]
        );
    }

    #[test]
    fn parses_status_names() {
        assert_eq!("LIVE".parse::<SessionStatus>(), Ok(SessionStatus::Live));
        assert!("paused".parse::<SessionStatus>().is_err());
        assert_eq!(SessionStatus::Upcoming.to_string(), "upcoming");
    }
}
