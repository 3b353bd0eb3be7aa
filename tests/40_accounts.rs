mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use campus_portal::auth::{issue_token, Claims};
use campus_portal::config::config;
use campus_portal::database::DatabaseManager;

// One test per binary: the pool is process-wide and bound to the first runtime
#[tokio::test]
async fn account_and_token_lifecycle() -> Result<()> {
    if !common::database_ready().await? {
        return Ok(());
    }

    let ada = common::register("ada").await?;

    // Duplicate registration
    let (status, body) = common::send(common::json_request(
        "POST",
        "/auth/register",
        None,
        json!({ "email": ada.email.to_uppercase(), "password": common::PASSWORD }),
    ))
    .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Unknown email and wrong password look identical
    let (wrong_status, wrong_body) = common::send(common::json_request(
        "POST",
        "/auth/login",
        None,
        json!({ "email": ada.email, "password": "not the password" }),
    ))
    .await?;
    let (unknown_status, unknown_body) = common::send(common::json_request(
        "POST",
        "/auth/login",
        None,
        json!({ "email": common::unique_email("nobody"), "password": common::PASSWORD }),
    ))
    .await?;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let (status, body) = common::send(common::json_request(
        "POST",
        "/auth/login",
        None,
        json!({ "email": format!(" {} ", ada.email.to_uppercase()), "password": common::PASSWORD }),
    ))
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let login = common::account_from(ada.email.clone(), &body["data"])?;
    assert_eq!(login.user_id, ada.user_id);
    assert_ne!(login.session_id, ada.session_id);

    let (status, body) = common::send(common::get_with_token("/api/auth/whoami", &login.token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_admin"], false);
    assert_eq!(body["data"]["session_id"], login.session_id.to_string());

    // An expired token is refused by protected routes but still refreshes
    let security = &config().security;
    let issued = Utc::now() - Duration::hours(security.jwt_expiry_hours as i64 + 1);
    let expired = issue_token(&Claims::new(ada.user_id, ada.email.clone(), login.session_id, issued, security), security)?;

    let (status, _) = common::send(common::get_with_token("/api/auth/whoami", &expired)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = common::send(common::json_request("POST", "/auth/refresh", None, json!({ "token": expired }))).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let refreshed = common::account_from(ada.email.clone(), &body["data"])?;
    assert_eq!(refreshed.session_id, login.session_id);

    let (status, _) = common::send(common::get_with_token("/api/auth/whoami", &refreshed.token)).await?;
    assert_eq!(status, StatusCode::OK);

    // A session past its refresh window cannot be renewed
    sqlx::query("UPDATE auth_sessions SET refresh_until = now() - interval '1 minute' WHERE id = $1")
        .bind(ada.session_id)
        .execute(DatabaseManager::pool()?)
        .await?;
    let (status, _) = common::send(common::json_request("POST", "/auth/refresh", None, json!({ "token": ada.token }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signing out revokes every token bound to that session
    let (status, body) = common::send(common::delete_with_token("/api/auth/session", &refreshed.token)).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["signed_out"], true);

    for token in [&login.token, &refreshed.token] {
        let (status, _) = common::send(common::get_with_token("/api/auth/whoami", token)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _) = common::send(common::json_request("POST", "/auth/refresh", None, json!({ "token": expired }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
