//! Board Webhook Routes
//!
//! Inbound adapter for board events. Every mutating endpoint verifies the
//! shared secret first (dedicated header or bearer token); a mismatch is
//! rejected with 401 before anything touches storage. Handler failures map
//! to 500 - only authentication failures surface their own status.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::ingest::{self, WebhookPayload};
use crate::state::AppState;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Verify the shared secret. Accepted either via the dedicated header or
/// as a bearer token. An unset secret disables verification - explicit
/// development opt-out.
fn verify_secret(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = state.board.webhook_secret() else {
        return Ok(());
    };

    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .or_else(|| {
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
        });

    match presented {
        Some(secret) if secret == expected => Ok(()),
        _ => {
            tracing::warn!("Webhook rejected: secret mismatch");
            Err(ApiError::unauthorized("Invalid webhook secret"))
        }
    }
}

/// Webhook processing failures other than authentication must surface as
/// 500 regardless of their internal category.
fn internalize(err: ApiError) -> ApiError {
    if err.code == ErrorCode::Unauthorized {
        err
    } else {
        tracing::error!(error = %err, "Webhook processing failed");
        ApiError::internal_error(err.message)
    }
}

/// POST /webhook/board - generic event dispatch.
pub async fn handle_board_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<StatusCode> {
    verify_secret(&state, &headers)?;

    tracing::info!(
        event = %payload.event,
        card_id = ?payload.data.as_ref().and_then(|d| d.card_id()),
        "Received board webhook"
    );

    ingest::dispatch(&state, &payload)
        .await
        .map_err(internalize)?;
    Ok(StatusCode::OK)
}

/// POST /webhook/board/card-moved - a card changed lists.
pub async fn handle_card_moved(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<StatusCode> {
    verify_secret(&state, &headers)?;

    let data = payload.data.as_ref();
    tracing::info!(
        card_id = ?data.and_then(|d| d.card_id()),
        from = ?data.and_then(|d| d.previous_list_name.clone()),
        to = ?data.and_then(|d| d.list_name.clone()),
        moved_by = ?payload.effective_user().and_then(|u| u.username.clone()),
        "Board card moved"
    );

    ingest::handle_card_moved(&state, &payload)
        .await
        .map_err(internalize)?;
    Ok(StatusCode::OK)
}

/// POST /webhook/board/card-updated - a card's fields changed.
pub async fn handle_card_updated(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<StatusCode> {
    verify_secret(&state, &headers)?;

    tracing::info!(
        card_id = ?payload.data.as_ref().and_then(|d| d.card_id()),
        "Board card updated"
    );

    ingest::handle_card_updated(&state, &payload)
        .await
        .map_err(internalize)?;
    Ok(StatusCode::OK)
}

/// GET /webhook/board/health - integration liveness.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Board webhook endpoint is healthy")
}

/// Create the webhook routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(handle_board_event))
        .route("/card-moved", post(handle_card_moved))
        .route("/card-updated", post(handle_card_updated))
        .route("/health", get(health_check))
}
