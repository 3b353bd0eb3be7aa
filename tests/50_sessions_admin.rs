mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use campus_portal::database::DatabaseManager;

async fn create_session(token: &str, title: &str) -> Result<Value> {
    let (status, body) = common::send(common::json_request(
        "POST",
        "/api/sessions",
        Some(token),
        json!({
            "title": title,
            "meeting_link": "https://meet.example.edu/room",
            "scheduled_start_time": "2030-01-07T18:00:00",
            "estimated_duration": 90,
        }),
    ))
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create failed: {status} {body}");
    Ok(body["data"].clone())
}

async fn set_report(token: &str, id: Uuid, status: &str) -> Result<(StatusCode, Value)> {
    common::send(common::json_request(
        "PATCH",
        &format!("/api/admin/reports/{}", id),
        Some(token),
        json!({ "status": status }),
    ))
    .await
}

// One test per binary: the pool is process-wide and bound to the first runtime
#[tokio::test]
async fn hosts_students_and_admins() -> Result<()> {
    if !common::database_ready().await? {
        return Ok(());
    }

    let host = common::register("host").await?;
    let student = common::register("student").await?;
    let admin = common::register("admin").await?;
    common::make_admin(admin.user_id).await?;

    // Admin gate
    let (status, body) = common::send(common::get_with_token("/api/admin/stats", &student.token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = common::send(common::get_with_token("/api/admin/reports", &student.token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = common::send(common::get_with_token("/api/admin/stats", &admin.token)).await?;
    assert_eq!(status, StatusCode::OK, "{body}");

    // Naive start times are read as UTC; expiry follows start plus duration
    let session = create_session(&host.token, "Thermodynamics review").await?;
    assert_eq!(session["host_id"], host.user_id.to_string());
    assert_eq!(session["status"], "upcoming");
    assert_eq!(session["ends_at"], "2030-01-07T19:30:00Z");
    let session_id = session["id"].as_str().unwrap_or_default().to_string();
    let uri = format!("/api/sessions/{}", session_id);

    let (status, body) = common::send(common::json_request(
        "POST",
        "/api/sessions",
        Some(&host.token),
        json!({ "title": "Bad clock", "scheduled_start_time": "next tuesday" }),
    ))
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    // Only the host or an admin may delete
    let (status, _) = common::send(common::delete_with_token(&uri, &student.token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = common::send(common::get_with_token(&uri, &student.token)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = common::send(common::delete_with_token(&uri, &host.token)).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["deleted"], true);
    let (status, _) = common::send(common::get_with_token(&uri, &host.token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let other = create_session(&host.token, "Organic chemistry drills").await?;
    let other_uri = format!("/api/sessions/{}", other["id"].as_str().unwrap_or_default());
    let (status, body) = common::send(common::delete_with_token(&other_uri, &admin.token)).await?;
    assert_eq!(status, StatusCode::OK, "{body}");

    // Database constraints surface as bad requests
    let (status, body) = common::send(common::json_request(
        "POST",
        "/api/data/exams",
        Some(&student.token),
        json!({ "title": "Midterm", "exam_date": "2030-02-01T09:00:00Z", "duration_minutes": -30 }),
    ))
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // Moderation stamps and clears resolved_at
    let (report_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO user_reports (reporter_id, reported_user_id, reason) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(student.user_id)
    .bind(host.user_id)
    .bind("Spam links in session description")
    .fetch_one(DatabaseManager::pool()?)
    .await?;

    let (status, _) = set_report(&student.token, report_id, "resolved").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = set_report(&admin.token, report_id, "resolved").await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "resolved");
    assert!(body["data"]["resolved_at"].is_string());

    let (status, body) = set_report(&admin.token, report_id, "open").await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "open");
    assert!(body["data"]["resolved_at"].is_null());

    let (status, _) = set_report(&admin.token, Uuid::new_v4(), "dismissed").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
