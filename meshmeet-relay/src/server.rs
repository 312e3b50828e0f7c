use crate::config::RelayConfig;
use crate::hub::RelayHub;
use crate::signaling::ws_handler;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(hub: RelayHub) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(hub)
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    serve_on(listener, RelayHub::new()).await
}

/// Serves on an already bound listener; tests bind port 0 and read the address back.
pub async fn serve_on(listener: TcpListener, hub: RelayHub) -> Result<()> {
    info!("Relay listening on {}", listener.local_addr()?);
    axum::serve(listener, router(hub))
        .await
        .context("Relay server stopped")?;
    Ok(())
}
