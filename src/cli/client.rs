use anyhow::Context;
use chrono::{Duration, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};

use super::config::{load_auth_state, load_server_config, save_auth_state};
use crate::auth::{AuthEvent, AuthState};

/// Tokens expiring within this window are refreshed before use
const REFRESH_SKEW_MINUTES: i64 = 5;

/// Thin HTTP client for the Campus Portal API.
///
/// Unwraps the `{success, data}` envelope and turns error bodies into
/// `anyhow` errors carrying the server's message.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            token,
        }
    }

    /// Client for the configured server without credentials
    pub fn anonymous() -> anyhow::Result<Self> {
        Ok(Self::new(load_server_config()?.url, None))
    }

    /// Client carrying the stored token, refreshed first when close to expiry
    pub async fn authenticated() -> anyhow::Result<Self> {
        let mut state = load_auth_state()?;
        if state.token().is_none() {
            anyhow::bail!("Not signed in. Run `campus auth login <email>` first");
        }

        let client = Self::anonymous()?;
        if state.needs_refresh(Utc::now(), Duration::minutes(REFRESH_SKEW_MINUTES)) {
            state = client.refresh(state).await?;
        }
        Ok(Self::new(client.base_url, state.token().map(str::to_string)))
    }

    /// Client carrying the token held by `state`, as-is
    pub fn authenticated_with(state: &AuthState) -> anyhow::Result<Self> {
        let token = state.token().context("Not signed in")?;
        Ok(Self::new(load_server_config()?.url, Some(token.to_string())))
    }

    /// Exchange the stored token for a new one and persist the result
    pub async fn refresh(&self, state: AuthState) -> anyhow::Result<AuthState> {
        let token = state.token().context("Not signed in")?.to_string();
        let data = self.post("/auth/refresh", &json!({ "token": token })).await?;

        let token = data["token"].as_str().context("Refresh response has no token")?.to_string();
        let expires_at = serde_json::from_value(data["expires_at"].clone()).unwrap_or(None);
        let state = state.apply(AuthEvent::TokenRefreshed { token, expires_at });
        save_auth_state(&state)?;
        tracing::debug!("Refreshed API token");
        Ok(state)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        unwrap_envelope(self.send(self.request(Method::GET, path)).await?).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        unwrap_envelope(self.send(self.request(Method::POST, path).json(body)).await?).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        unwrap_envelope(self.send(self.request(Method::DELETE, path)).await?).await
    }

    /// Raw body of a non-JSON endpoint such as a calendar export
    pub async fn get_text(&self, path: &str) -> anyhow::Result<String> {
        let response = self.send(self.request(Method::GET, path)).await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.text().await?)
    }

    /// Health endpoint answers 503 with a body, so status is returned as-is
    pub async fn health(&self) -> anyhow::Result<(StatusCode, Value)> {
        let response = self.send(self.request(Method::GET, "/health")).await?;
        let status = response.status();
        Ok((status, response.json().await.unwrap_or(Value::Null)))
    }

    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<Response> {
        builder
            .send()
            .await
            .with_context(|| format!("Could not reach {}", self.base_url))
    }
}

async fn unwrap_envelope(response: Response) -> anyhow::Result<Value> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }
    let body: Value = response.json().await.context("Server returned invalid JSON")?;
    Ok(extract_data(body))
}

/// `{success, data}` becomes `data`; anything else passes through
pub fn extract_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

async fn error_from(response: Response) -> anyhow::Error {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    anyhow::anyhow!(error_message(status, &body))
}

pub fn error_message(status: StatusCode, body: &Value) -> String {
    let message = body["message"].as_str().or_else(|| body["error"].as_str()).unwrap_or("request failed");
    let mut text = format!("{} ({})", message, status);
    if let Some(fields) = body["field_errors"].as_object() {
        for (field, problem) in fields {
            text.push_str(&format!("\n  {}: {}", field, problem.as_str().unwrap_or_default()));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_enveloped_data() {
        assert_eq!(extract_data(json!({ "success": true, "data": [1, 2] })), json!([1, 2]));
        assert_eq!(extract_data(json!({ "other": 1 })), json!({ "other": 1 }));
    }

    #[test]
    fn formats_server_errors_with_fields() {
        let body = json!({
            "error": true,
            "message": "Invalid session",
            "code": "VALIDATION_ERROR",
            "field_errors": { "title": "Title is required" }
        });
        let text = error_message(StatusCode::BAD_REQUEST, &body);
        assert!(text.starts_with("Invalid session (400 Bad Request)"));
        assert!(text.contains("title: Title is required"));
    }
}
