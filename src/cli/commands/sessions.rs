use clap::Subcommand;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_success, output_value, write_output};
use crate::cli::OutputFormat;
use crate::sessions::SessionStatus;

#[derive(Subcommand)]
pub enum SessionCommands {
    #[command(about = "List sessions, live ones first")]
    List {
        #[arg(long, help = "Only sessions for this course id")]
        course: Option<String>,
        #[arg(long, help = "live, upcoming or ended")]
        status: Option<SessionStatus>,
    },

    #[command(about = "Host a new session (starts now unless --start is given)")]
    Create {
        #[arg(help = "Session title")]
        title: String,
        #[arg(long, help = "Course id")]
        course: Option<String>,
        #[arg(long, help = "Meeting link (http or https)")]
        link: Option<String>,
        #[arg(long, help = "Scheduled start, RFC 3339")]
        start: Option<String>,
        #[arg(long, help = "Duration in minutes")]
        duration: Option<i32>,
        #[arg(long, help = "Description")]
        description: Option<String>,
    },

    #[command(about = "Delete a session you host")]
    Delete {
        #[arg(help = "Session id")]
        id: String,
    },

    #[command(about = "Download one session as .ics")]
    Export {
        #[arg(help = "Session id")]
        id: String,
        #[arg(long, help = "Output file (stdout when omitted)")]
        out: Option<PathBuf>,
    },
}

/// Request body for `POST /api/sessions`, omitting unset fields
pub fn create_body(
    title: String,
    course: Option<String>,
    link: Option<String>,
    start: Option<String>,
    duration: Option<i32>,
    description: Option<String>,
) -> Value {
    let mut body = Map::new();
    body.insert("title".to_string(), json!(title));
    let optional = [
        ("course_id", course.map(Value::from)),
        ("meeting_link", link.map(Value::from)),
        ("scheduled_start_time", start.map(Value::from)),
        ("estimated_duration", duration.map(Value::from)),
        ("description", description.map(Value::from)),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            body.insert(key.to_string(), value);
        }
    }
    Value::Object(body)
}

pub async fn handle(cmd: SessionCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = ApiClient::authenticated().await?;

    match cmd {
        SessionCommands::List { course, status } => {
            let mut query = Vec::new();
            if let Some(course) = course {
                query.push(format!("course_id={}", course));
            }
            if let Some(status) = status {
                query.push(format!("status={}", status));
            }
            let path = if query.is_empty() {
                "/api/sessions".to_string()
            } else {
                format!("/api/sessions?{}", query.join("&"))
            };
            output_value(output_format, &client.get(&path).await?)
        }
        SessionCommands::Create { title, course, link, start, duration, description } => {
            let body = create_body(title, course, link, start, duration, description);
            let session = client.post("/api/sessions", &body).await?;
            let message = format!(
                "Created session {} ({})",
                session["id"].as_str().unwrap_or_default(),
                session["status"].as_str().unwrap_or_default()
            );
            output_success(output_format, &message, Some(session))
        }
        SessionCommands::Delete { id } => {
            client.delete(&format!("/api/sessions/{}", id)).await?;
            output_success(output_format, &format!("Deleted session {}", id), None)
        }
        SessionCommands::Export { id, out } => {
            let ics = client.get_text(&format!("/api/sessions/{}/calendar.ics", id)).await?;
            write_output(out.as_deref(), &ics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_skips_unset_fields() {
        let body = create_body("Calc review".to_string(), None, None, None, Some(45), None);
        assert_eq!(body, json!({ "title": "Calc review", "estimated_duration": 45 }));
    }
}
