use campus_portal::{config, database::DatabaseManager, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("campus_portal=info,tower_http=info")),
        )
        .init();

    let app_config = config::config();
    tracing::info!("Starting Campus Portal API in {:?} mode", app_config.environment);

    if app_config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    if app_config.database.auto_migrate {
        DatabaseManager::migrate().await?;
    }

    let bind_addr = format!("0.0.0.0:{}", app_config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Campus Portal API listening on http://{}", bind_addr);

    axum::serve(listener, server::app())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
