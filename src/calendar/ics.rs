use chrono::{DateTime, Utc};
use thiserror::Error;

const CRLF: &str = "\r\n";
const MAX_LINE_OCTETS: usize = 75;
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Error, PartialEq)]
pub enum CalendarError {
    #[error("Event is missing a UID")]
    MissingUid,

    #[error("Event '{0}' is missing a summary")]
    MissingSummary(String),

    #[error("Event '{0}' ends before it starts")]
    EndBeforeStart(String),

    #[error("Event '{0}' has an invalid URL")]
    InvalidUrl(String),

    #[error("Product identifier contains control characters")]
    InvalidProductId,
}

/// One VEVENT in an exported calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

impl CalendarEvent {
    pub fn new(uid: impl Into<String>, summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            start,
            end,
            summary: summary.into(),
            description: None,
            location: None,
            url: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.uid.trim().is_empty() {
            return Err(CalendarError::MissingUid);
        }
        if self.summary.trim().is_empty() {
            return Err(CalendarError::MissingSummary(self.uid.clone()));
        }
        if self.end < self.start {
            return Err(CalendarError::EndBeforeStart(self.uid.clone()));
        }
        if let Some(url) = &self.url {
            if !is_web_url(url) {
                return Err(CalendarError::InvalidUrl(self.uid.clone()));
            }
        }
        Ok(())
    }
}

/// An iCalendar (RFC 5545) document under construction.
#[derive(Debug, Clone)]
pub struct Calendar {
    product_id: String,
    stamp: DateTime<Utc>,
    events: Vec<CalendarEvent>,
}

impl Calendar {
    pub fn new(product_id: impl Into<String>, stamp: DateTime<Utc>) -> Self {
        Self {
            product_id: product_id.into(),
            stamp,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: CalendarEvent) -> &mut Self {
        self.events.push(event);
        self
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = CalendarEvent>) -> &mut Self {
        self.events.extend(events);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialize to `.ics` text. Fails without output if any event is invalid.
    pub fn to_ics(&self) -> Result<String, CalendarError> {
        if self.product_id.chars().any(char::is_control) {
            return Err(CalendarError::InvalidProductId);
        }
        for event in &self.events {
            event.validate()?;
        }

        let mut out = String::new();
        write_line(&mut out, "BEGIN:VCALENDAR");
        write_line(&mut out, "VERSION:2.0");
        write_line(&mut out, &format!("PRODID:{}", self.product_id));
        write_line(&mut out, "CALSCALE:GREGORIAN");
        write_line(&mut out, "METHOD:PUBLISH");

        let stamp = format_date_time(&self.stamp);
        for event in &self.events {
            write_line(&mut out, "BEGIN:VEVENT");
            write_line(&mut out, &format!("UID:{}", escape_text(&event.uid)));
            write_line(&mut out, &format!("DTSTAMP:{}", stamp));
            write_line(&mut out, &format!("DTSTART:{}", format_date_time(&event.start)));
            write_line(&mut out, &format!("DTEND:{}", format_date_time(&event.end)));
            write_line(&mut out, &format!("SUMMARY:{}", escape_text(&event.summary)));
            if let Some(description) = &event.description {
                write_line(&mut out, &format!("DESCRIPTION:{}", escape_text(description)));
            }
            if let Some(location) = &event.location {
                write_line(&mut out, &format!("LOCATION:{}", escape_text(location)));
            }
            if let Some(url) = &event.url {
                write_line(&mut out, &format!("URL:{}", url));
            }
            write_line(&mut out, "END:VEVENT");
        }

        write_line(&mut out, "END:VCALENDAR");
        Ok(out)
    }
}

/// URI values are written unescaped, so they must be a single-line http(s) URL.
pub fn is_web_url(value: &str) -> bool {
    if value.chars().any(char::is_control) {
        return false;
    }
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// `YYYYMMDDTHHMMSS`, UTC wall clock, no separators.
pub fn format_date_time(value: &DateTime<Utc>) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// Escape a TEXT property value.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Append a content line, folding it at 75 octets without splitting a
/// UTF-8 sequence. Continuation lines start with a single space.
fn write_line(out: &mut String, line: &str) {
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > budget {
            out.push_str(CRLF);
            out.push(' ');
            // the leading space counts against the continuation line
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(c);
        used += width;
    }
    out.push_str(CRLF);
}
