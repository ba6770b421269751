//! RFC API Server Entry Point
//!
//! Bootstraps configuration, storage, the board gateway, the status
//! refresh job, and the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use rfc_api::{
    create_api_router, status_refresh_task, ApiConfig, ApiError, ApiResult, AppState,
    BoardConfig, BoardGateway, StatusRefreshConfig,
};
use rfc_storage::InMemoryStorage;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let board_config = BoardConfig::from_env();
    let refresh_config = StatusRefreshConfig::from_env();
    let api_config = ApiConfig::from_env();

    let store = Arc::new(InMemoryStorage::new());
    let board = Arc::new(BoardGateway::new(board_config)?);
    let state = AppState::new(store, board);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = tokio::spawn(status_refresh_task(
        state.clone(),
        refresh_config,
        shutdown_rx,
    ));

    let app: Router = create_api_router(state);

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, "Starting RFC API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Ok(metrics) = refresh_handle.await {
        let snapshot = metrics.snapshot();
        tracing::info!(
            passes = snapshot.passes,
            statuses_updated = snapshot.statuses_updated,
            "Status refresh job drained"
        );
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", config.bind_host, config.bind_port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e)))
}
