use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub sessions: SessionConfig,
    pub calendar: CalendarConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: i32,
    pub max_limit: Option<i32>,
    pub max_nested_depth: u32,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_hours: u64,
    pub refresh_window_days: u64,
    pub admin_emails: Vec<String>,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Duration assumed for scheduled sessions created without one
    pub default_duration_minutes: i64,
    /// Lifetime of an unscheduled ("start now") session
    pub adhoc_ttl_minutes: i64,
    pub max_duration_minutes: i64,
    /// How long ended sessions stay in `/api/sessions`
    pub ended_retention_hours: i64,
    /// Upper bound on rows returned by one listing
    pub max_listed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub product_id: String,
    pub exam_duration_minutes: i64,
    pub assignment_block_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root_path: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_DEFAULT_LIMIT") {
            self.filter.default_limit = v.parse().unwrap_or(self.filter.default_limit);
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = v.parse().unwrap_or(self.database.auto_migrate);
        }

        if let Some(port) = env::var("CAMPUS_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_WINDOW_DAYS") {
            self.security.refresh_window_days = v.parse().unwrap_or(self.security.refresh_window_days);
        }
        if let Ok(v) = env::var("SECURITY_ADMIN_EMAILS") {
            self.security.admin_emails = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        if let Ok(v) = env::var("SESSIONS_DEFAULT_DURATION_MINUTES") {
            self.sessions.default_duration_minutes = v.parse().unwrap_or(self.sessions.default_duration_minutes);
        }
        if let Ok(v) = env::var("SESSIONS_ADHOC_TTL_MINUTES") {
            self.sessions.adhoc_ttl_minutes = v.parse().unwrap_or(self.sessions.adhoc_ttl_minutes);
        }
        if let Ok(v) = env::var("SESSIONS_ENDED_RETENTION_HOURS") {
            self.sessions.ended_retention_hours = v.parse().unwrap_or(self.sessions.ended_retention_hours);
        }
        if let Ok(v) = env::var("SESSIONS_MAX_LISTED") {
            self.sessions.max_listed = v.parse().unwrap_or(self.sessions.max_listed);
        }

        if let Ok(v) = env::var("CALENDAR_PRODUCT_ID") {
            self.calendar.product_id = v;
        }

        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.storage.root_path = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("STORAGE_MAX_UPLOAD_BYTES") {
            self.storage.max_upload_bytes = v.parse().unwrap_or(self.storage.max_upload_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                default_limit: 100,
                max_limit: Some(1000),
                max_nested_depth: 10,
                debug_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                auto_migrate: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "campus-development-secret".to_string(),
                jwt_issuer: "campus-portal".to_string(),
                jwt_expiry_hours: 24,
                refresh_window_days: 30,
                admin_emails: vec![],
                cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:8080".to_string()],
            },
            sessions: SessionConfig::default(),
            calendar: CalendarConfig::default(),
            storage: StorageConfig {
                root_path: "./storage".to_string(),
                public_base_url: "http://localhost:3000/storage".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                default_limit: 50,
                max_limit: Some(500),
                max_nested_depth: 5,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                auto_migrate: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "campus-portal".to_string(),
                jwt_expiry_hours: 4,
                refresh_window_days: 14,
                admin_emails: vec![],
                cors_origins: vec!["https://staging.campus.example.com".to_string()],
            },
            sessions: SessionConfig::default(),
            calendar: CalendarConfig::default(),
            storage: StorageConfig {
                root_path: "/var/lib/campus/storage".to_string(),
                public_base_url: "https://staging.campus.example.com/storage".to_string(),
                max_upload_bytes: 2 * 1024 * 1024,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                default_limit: 50,
                max_limit: Some(100),
                max_nested_depth: 3,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                auto_migrate: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "campus-portal".to_string(),
                jwt_expiry_hours: 1,
                refresh_window_days: 14,
                admin_emails: vec![],
                cors_origins: vec!["https://campus.example.com".to_string()],
            },
            sessions: SessionConfig::default(),
            calendar: CalendarConfig::default(),
            storage: StorageConfig {
                root_path: "/var/lib/campus/storage".to_string(),
                public_base_url: "https://campus.example.com/storage".to_string(),
                max_upload_bytes: 2 * 1024 * 1024,
            },
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 60,
            adhoc_ttl_minutes: 120,
            max_duration_minutes: 24 * 60,
            ended_retention_hours: 24,
            max_listed: 500,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            product_id: "-//Campus Portal//Study Sessions//EN".to_string(),
            exam_duration_minutes: 120,
            assignment_block_minutes: 60,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
