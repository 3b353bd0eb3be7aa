mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    for uri in [
        "/api/auth/whoami",
        "/api/sessions",
        "/api/calendar.ics",
        "/api/data/courses",
        "/api/partners/matches",
    ] {
        let (status, body) = common::send(common::get(uri)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], "UNAUTHORIZED", "{uri}");
        assert_eq!(body["error"], true, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_tokens_are_rejected() -> Result<()> {
    let (status, body) = common::send(common::get_with_token("/api/sessions", "not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap_or_default().contains("Invalid token"));
    Ok(())
}

#[tokio::test]
async fn non_bearer_schemes_are_rejected() -> Result<()> {
    let request = Request::builder()
        .uri("/api/auth/whoami")
        .header("authorization", "Basic YWRhOnNlY3JldA==")
        .body(Body::empty())?;
    let (status, _) = common::send(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_routes_authenticate_before_checking_role() -> Result<()> {
    for uri in ["/api/admin/stats", "/api/admin/reports"] {
        let (status, _) = common::send(common::get(uri)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn avatar_upload_requires_a_token() -> Result<()> {
    let request = Request::builder()
        .method("POST")
        .uri("/api/storage/avatar")
        .header("content-type", "image/png")
        .body(Body::from(vec![0u8; 16]))?;
    let (status, _) = common::send(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
