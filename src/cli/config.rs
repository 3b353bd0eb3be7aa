use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::AuthState;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub added_at: DateTime<Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            added_at: Utc::now(),
        }
    }
}

impl ServerConfig {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let parsed = url::Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Server URL must use http or https");
        }
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            added_at: Utc::now(),
        })
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CAMPUS_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("campus").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn load_server_config_from(dir: &Path) -> anyhow::Result<ServerConfig> {
    load_json(&dir.join("server.json"))
}

pub fn save_server_config_to(dir: &Path, config: &ServerConfig) -> anyhow::Result<()> {
    save_json(&dir.join("server.json"), config)
}

pub fn load_auth_state_from(dir: &Path) -> anyhow::Result<AuthState> {
    load_json(&dir.join("auth.json"))
}

/// Signed-out state is stored as the absence of the file
pub fn save_auth_state_to(dir: &Path, state: &AuthState) -> anyhow::Result<()> {
    let path = dir.join("auth.json");
    match state {
        AuthState::SignedOut => {
            if path.exists() {
                fs::remove_file(path)?;
            }
            Ok(())
        }
        AuthState::SignedIn(_) => save_json(&path, state),
    }
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_server_config_from(&get_config_dir()?)
}

pub fn save_server_config(config: &ServerConfig) -> anyhow::Result<()> {
    save_server_config_to(&get_config_dir()?, config)
}

pub fn load_auth_state() -> anyhow::Result<AuthState> {
    load_auth_state_from(&get_config_dir()?)
}

pub fn save_auth_state(state: &AuthState) -> anyhow::Result<()> {
    save_auth_state_to(&get_config_dir()?, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthEvent, StoredSession};
    use uuid::Uuid;

    #[test]
    fn server_urls_are_validated_and_trimmed() {
        assert_eq!(ServerConfig::new("https://campus.example.com/").unwrap().url, "https://campus.example.com");
        assert!(ServerConfig::new("ftp://campus.example.com").is_err());
        assert!(ServerConfig::new("not a url").is_err());
    }

    #[test]
    fn missing_files_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_server_config_from(dir.path()).unwrap().url, DEFAULT_SERVER_URL);
        assert_eq!(load_auth_state_from(dir.path()).unwrap(), AuthState::SignedOut);
    }

    #[test]
    fn auth_state_survives_a_round_trip_and_sign_out_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let state = AuthState::SignedOut.apply(AuthEvent::SignedIn(StoredSession {
            token: "tok".to_string(),
            expires_at: None,
            session_id: Uuid::nil(),
            user_id: Uuid::nil(),
            email: "ada@uni.edu".to_string(),
            is_admin: true,
        }));

        save_auth_state_to(dir.path(), &state).unwrap();
        assert_eq!(load_auth_state_from(dir.path()).unwrap(), state);

        let state = state.apply(AuthEvent::SignedOut);
        save_auth_state_to(dir.path(), &state).unwrap();
        assert!(!dir.path().join("auth.json").exists());
    }
}
