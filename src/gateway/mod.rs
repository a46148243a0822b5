pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use state::AppState;

/// Build the gateway router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Transfer API
        .route("/TransferFunds", post(handlers::transfer_funds))
        .with_state(state)
}

/// Start HTTP Gateway server, returning once ctrl-c is received
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    // Bind address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        )
    })?;

    info!("Gateway listening on http://{}", addr);
    info!("Transfer API: POST /TransferFunds");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install ctrl-c handler");
        // Never resolve: keep serving without graceful shutdown
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
