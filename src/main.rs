//! evently server entry point.
//!
//! Loads configuration, selects the store, and starts the Axum HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use evently::api;
use evently::app_state::AppState;
use evently::config::{AppConfig, LogFormat};
use evently::persistence::{MemoryStore, PostgresStore, Store};
use evently::service::ServicesProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting evently");

    // Select the store
    let store: Arc<dyn Store> = if config.persistence_enabled {
        let store = PostgresStore::connect(&config).await?;
        if config.run_migrations {
            store.migrate().await?;
            tracing::info!("database migrations applied");
        }
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, data lives in memory only");
        Arc::new(MemoryStore::new())
    };

    // Build application state
    let app_state = AppState::new(ServicesProvider::new(store), config.default_locale);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
