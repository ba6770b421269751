//! RFC API - HTTP Layer and Reconciliation Engine
//!
//! Exposes the workflow over REST (Axum), ingests board webhooks, pushes
//! RFC state to the external board, and runs the periodic status
//! derivation job. Storage is abstracted behind rfc-storage's trait.

pub mod auth;
pub mod board;
pub mod config;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod routes;
pub mod services;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-export commonly used types
pub use board::{list_names_for_status, status_for_list_name, BoardClient, BoardGateway};
pub use config::{ApiConfig, BoardConfig, StatusRefreshConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use ingest::{BoardEventKind, WebhookPayload};
pub use jobs::{run_pass, status_refresh_task, StatusRefreshMetrics};
pub use state::AppState;

/// Assemble the full API router.
pub fn create_api_router(state: AppState) -> Router {
    let rfc_routes = Router::new()
        .merge(routes::rfc::create_router())
        .merge(routes::subsystem_status::create_router())
        .merge(routes::approval::create_router())
        .merge(routes::history::create_router());

    Router::new()
        .nest("/api/rfcs", rfc_routes)
        .nest("/webhook/board", routes::webhook::create_router())
        .route("/health", get(routes::health::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
