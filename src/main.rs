use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cicerone::analytics::{CountryResolver, VisitorHasher};
use cicerone::api::{self, AppState};
use cicerone::config::Config;
use cicerone::storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let storage = storage::connect(&config.database).await?;

    info!("Initializing database...");
    storage
        .init()
        .await
        .context("Failed to initialize analytics schema")?;
    info!("Database initialized successfully");

    // Country lookups
    let resolver = CountryResolver::from_config(&config.analytics)?;
    match config.analytics.geoip_db_path.as_deref() {
        Some(path) => info!("🌍 Country detection enabled (GeoIP database: {})", path),
        None => warn!("GEOIP_DB_PATH is not set; pageviews will be stored without a country"),
    }

    if config.analytics.ephemeral_salt {
        warn!(
            "🔑 Using an ephemeral visitor salt; \
             set ANALYTICS_SALT to keep visitors stable across restarts"
        );
    }
    let hasher = VisitorHasher::new(config.analytics.salt.clone());

    let state = Arc::new(AppState::new(Arc::clone(&storage), hasher, resolver));
    let router = api::create_api_router(state);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("Failed to bind {}", api_addr))?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Beacons accepted at http://{}/api/analytics/{{pageview,event}}", api_addr);
    info!("   - Stats available at http://{}/api/analytics/stats?days=7", api_addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
