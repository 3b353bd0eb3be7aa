use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{config, AppConfig};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin};

/// The full application router
pub fn app() -> Router {
    let app_config = config();

    let mut router = Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(auth_public_routes())
        .nest_service("/storage", ServeDir::new(&app_config.storage.root_path))
        // Protected API
        .merge(protected_routes(app_config))
        // Elevated API
        .merge(admin_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(app_config.api.max_request_size_bytes))
        .layer(cors_layer(app_config));

    if app_config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn auth_public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
}

fn protected_routes(app_config: &AppConfig) -> Router {
    use protected::{auth, calendar, data, find, notifications, partners, sessions, storage};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/session", axum::routing::delete(auth::logout))
        // Study sessions and calendar export
        .route("/api/sessions", get(sessions::list).post(sessions::create))
        .route("/api/sessions/:id", get(sessions::get).delete(sessions::delete))
        .route("/api/sessions/:id/calendar.ics", get(sessions::calendar))
        .route("/api/calendar.ics", get(calendar::export))
        // Generic table access
        .route("/api/data/:table", get(data::list).post(data::create))
        .route(
            "/api/data/:table/:id",
            get(data::get).patch(data::update).delete(data::delete),
        )
        .route("/api/find/:table", post(find::find))
        .route("/api/find/:table/count", post(find::count))
        .route("/api/partners/matches", get(partners::matches))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route(
            "/api/storage/avatar",
            post(storage::upload_avatar).layer(DefaultBodyLimit::max(app_config.storage.max_upload_bytes)),
        )
        .route_layer(from_fn(jwt_auth_middleware))
}

fn admin_routes() -> Router {
    use elevated::admin;

    Router::new()
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/reports", get(admin::reports))
        .route("/api/admin/reports/:id", patch(admin::update_report))
        // Outermost runs first: authenticate, then check admin
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer(app_config: &AppConfig) -> CorsLayer {
    if crate::is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = app_config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
