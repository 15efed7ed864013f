use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use flipkart_rag::core::config::{AppPaths, ConfigService};
use flipkart_rag::core::logging;
use flipkart_rag::server;
use flipkart_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    let config_service = ConfigService::new(paths.clone());
    let config = config_service
        .load_config()
        .with_context(|| format!("Failed to load {}", config_service.config_path().display()))?;

    logging::init(&paths, &config.server).context("Failed to initialize logging")?;
    tracing::debug!(
        "Effective config: {}",
        config_service.redact_sensitive_values(&config)
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    if config.server.debug {
        tracing::warn!("Debug mode is on; do not expose {} to untrusted networks", bind_addr);
    }

    let state = AppState::initialize(config).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
