mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let (status, body) = common::send(common::get("/")).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Campus Portal API");
    assert!(body["data"]["endpoints"]["sessions"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let (status, body) = common::send(common::get("/health")).await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );
    assert!(body["data"]["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_404() -> Result<()> {
    let (status, _) = common::send(common::get("/nope")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
