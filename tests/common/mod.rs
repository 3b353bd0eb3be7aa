#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

/// Drive the router in-process and decode the JSON body (Null when empty)
pub async fn send(request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = campus_portal::server::app().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn delete_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// False (and the caller skips) when no database is configured
pub async fn database_ready() -> anyhow::Result<bool> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return Ok(false);
    }
    campus_portal::database::manager::DatabaseManager::migrate().await?;
    Ok(true)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@uni.test", prefix, uuid::Uuid::new_v4().simple())
}

pub struct Account {
    pub email: String,
    pub user_id: uuid::Uuid,
    pub session_id: uuid::Uuid,
    pub token: String,
}

pub const PASSWORD: &str = "correct horse battery";

pub async fn register(prefix: &str) -> anyhow::Result<Account> {
    let email = unique_email(prefix);
    let (status, body) = send(json_request(
        "POST",
        "/auth/register",
        None,
        serde_json::json!({ "email": email, "password": PASSWORD, "full_name": prefix }),
    ))
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {status} {body}");
    account_from(email, &body["data"])
}

pub fn account_from(email: String, data: &Value) -> anyhow::Result<Account> {
    let field = |name: &str| {
        data[name]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing {name} in {data}"))
    };
    let user_id = data["user"]["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing user id in {data}"))?;
    Ok(Account {
        user_id: user_id.parse()?,
        session_id: field("session_id")?.parse()?,
        token: field("token")?,
        email,
    })
}

pub async fn make_admin(user_id: uuid::Uuid) -> anyhow::Result<()> {
    let pool = campus_portal::database::manager::DatabaseManager::pool()?;
    sqlx::query("UPDATE profiles SET role = 'admin' WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
