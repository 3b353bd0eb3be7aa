use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::auth::{AuthEvent, AuthState, StoredSession};
use crate::cli::client::ApiClient;
use crate::cli::config::{load_auth_state, save_auth_state};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, env = "CAMPUS_PASSWORD", help = "Password (prompted from stdin when omitted)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the stored token")]
    Logout,

    #[command(about = "Show local sign-in state")]
    Status,

    #[command(about = "Ask the server who the stored token belongs to")]
    Whoami,

    #[command(about = "Exchange the stored token for a fresh one")]
    Refresh,
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn stored_session(data: &Value) -> anyhow::Result<StoredSession> {
    Ok(StoredSession {
        token: data["token"].as_str().context("Login response has no token")?.to_string(),
        expires_at: serde_json::from_value(data["expires_at"].clone()).unwrap_or(None),
        session_id: serde_json::from_value(data["session_id"].clone()).context("Login response has no session id")?,
        user_id: serde_json::from_value(data["user"]["id"].clone()).context("Login response has no user id")?,
        email: data["user"]["email"].as_str().unwrap_or_default().to_string(),
        is_admin: false,
    })
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let data = ApiClient::anonymous()?
                .post("/auth/login", &json!({ "email": email, "password": password }))
                .await?;

            let state = AuthState::SignedOut.apply(AuthEvent::SignedIn(stored_session(&data)?));

            // Admin status comes from the server, not the token
            let whoami = ApiClient::authenticated_with(&state)?.get("/api/auth/whoami").await?;
            let state = state.apply(AuthEvent::AdminResolved(whoami["is_admin"].as_bool().unwrap_or(false)));
            save_auth_state(&state)?;

            output_success(output_format, &format!("Signed in as {}", email), Some(json!({ "is_admin": state.is_admin() })))
        }
        AuthCommands::Logout => {
            let state = load_auth_state()?;
            if state.token().is_some() {
                // Local state is cleared even if the server cannot be reached
                match ApiClient::authenticated_with(&state)?.delete("/api/auth/session").await {
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Server sign-out failed: {}", e),
                }
            }
            save_auth_state(&state.apply(AuthEvent::SignedOut))?;
            output_success(output_format, "Signed out", None)
        }
        AuthCommands::Status => {
            let state = load_auth_state()?;
            match (output_format, state.session()) {
                (OutputFormat::Json, _) => output_value(output_format, &json!({
                    "signed_in": state.session().is_some(),
                    "email": state.session().map(|s| s.email.clone()),
                    "expires_at": state.session().and_then(|s| s.expires_at),
                    "is_admin": state.is_admin(),
                })),
                (OutputFormat::Text, Some(session)) => {
                    println!("Signed in as {}{}", session.email, if session.is_admin { " (admin)" } else { "" });
                    if let Some(expires_at) = session.expires_at {
                        println!("Token expires {}", expires_at);
                    }
                    Ok(())
                }
                (OutputFormat::Text, None) => {
                    println!("Not signed in");
                    Ok(())
                }
            }
        }
        AuthCommands::Whoami => {
            let whoami = ApiClient::authenticated().await?.get("/api/auth/whoami").await?;
            let state = load_auth_state()?.apply(AuthEvent::AdminResolved(whoami["is_admin"].as_bool().unwrap_or(false)));
            save_auth_state(&state)?;
            output_value(output_format, &whoami)
        }
        AuthCommands::Refresh => {
            let state = ApiClient::anonymous()?.refresh(load_auth_state()?).await?;
            output_success(
                output_format,
                "Token refreshed",
                Some(json!({ "expires_at": state.session().and_then(|s| s.expires_at) })),
            )
        }
    }
}
