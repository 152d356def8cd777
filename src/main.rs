//! sealed-chat server entry point.
//!
//! Starts the Axum HTTP server and closes the connection pool on shutdown.

use tracing_subscriber::EnvFilter;

use sealed_chat::api;
use sealed_chat::app_state::AppState;
use sealed_chat::config::ChatConfig;
use sealed_chat::domain::EventBus;
use sealed_chat::persistence::{DbPool, PgManager};
use sealed_chat::service::{ChatService, TokenIssuer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = ChatConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting sealed-chat");

    // Build persistence and domain layers
    let pool = DbPool::new(PgManager::new(&config.database_url)?, config.pool_options())?;
    let event_bus = EventBus::new(config.event_bus_options());

    // Build service layer
    let chat_service = ChatService::new(pool.clone(), event_bus, config.acquire_timeout());
    if config.run_migrations {
        chat_service.migrate().await?;
    }
    let tokens = TokenIssuer::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.clone(),
        config.token_lifetime(),
    );

    // Build application
    let app = api::build_app(AppState::new(chat_service, tokens, config.poll_timeout()));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("draining database connections");
    pool.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
