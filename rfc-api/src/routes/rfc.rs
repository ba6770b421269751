//! RFC Routes
//!
//! The mutation entry points that feed the snapshot history and trigger
//! outbound board sync. Board calls run after the local write and never
//! fail the request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use rfc_core::Rfc;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::rfc::{self, CreateRfcInput, UpdateRfcInput};
use crate::state::AppState;

/// POST /api/rfcs - create an RFC.
pub async fn create_rfc(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateRfcInput>,
) -> ApiResult<(StatusCode, Json<Rfc>)> {
    let created = rfc::create_rfc(state.store.as_ref(), input, &user)?;

    if state.board.auto_sync() {
        state.board.sync_rfc(state.store.as_ref(), &created).await;
    }

    // Re-read so the response carries the card binding when sync succeeded.
    let rfc = rfc::get_live_rfc(state.store.as_ref(), created.id)?;
    Ok((StatusCode::CREATED, Json(rfc)))
}

/// GET /api/rfcs/:rfc_id - fetch one RFC.
pub async fn get_rfc(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
) -> ApiResult<Json<Rfc>> {
    let rfc = rfc::get_live_rfc(state.store.as_ref(), rfc_id)?;
    Ok(Json(rfc))
}

/// PATCH /api/rfcs/:rfc_id - update fields and the subsystem set.
pub async fn update_rfc(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<UpdateRfcInput>,
) -> ApiResult<Json<Rfc>> {
    let updated = rfc::update_rfc(state.store.as_ref(), rfc_id, input, &user)?;

    if state.board.auto_sync() {
        state.board.sync_rfc(state.store.as_ref(), &updated).await;
    }

    let rfc = rfc::get_live_rfc(state.store.as_ref(), updated.id)?;
    Ok(Json(rfc))
}

/// DELETE /api/rfcs/:rfc_id - soft-delete, removing the board card
/// best-effort.
pub async fn delete_rfc(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<StatusCode> {
    let deleted = rfc::delete_rfc(state.store.as_ref(), rfc_id)?;

    if let Some(card_id) = &deleted.board_card_id {
        state.board.delete_card(card_id).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Create the RFC routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_rfc))
        .route("/:rfc_id", get(get_rfc))
        .route("/:rfc_id", patch(update_rfc))
        .route("/:rfc_id", delete(delete_rfc))
}
