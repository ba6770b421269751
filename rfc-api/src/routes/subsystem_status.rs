//! Subsystem Status Routes
//!
//! The two state-machine axes of one subsystem link. Callers must be the
//! link's executor or an administrator.

use axum::{
    extract::{Path, State},
    routing::patch,
    Json, Router,
};
use rfc_core::{AffectedSubsystem, ConfirmationStatus, ExecutionStatus};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::subsystem_status;
use crate::state::AppState;

/// Request body for a confirmation status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfirmationStatusRequest {
    pub status: ConfirmationStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request body for an execution status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExecutionStatusRequest {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

/// PATCH /api/rfcs/:rfc_id/subsystems/:subsystem_id/confirmation-status
pub async fn update_confirmation_status(
    State(state): State<AppState>,
    Path((rfc_id, subsystem_id)): Path<(Uuid, Uuid)>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateConfirmationStatusRequest>,
) -> ApiResult<Json<AffectedSubsystem>> {
    let link = subsystem_status::update_confirmation_status(
        state.store.as_ref(),
        rfc_id,
        subsystem_id,
        request.status,
        &user,
    )?;
    Ok(Json(link))
}

/// PATCH /api/rfcs/:rfc_id/subsystems/:subsystem_id/execution-status
pub async fn update_execution_status(
    State(state): State<AppState>,
    Path((rfc_id, subsystem_id)): Path<(Uuid, Uuid)>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateExecutionStatusRequest>,
) -> ApiResult<Json<AffectedSubsystem>> {
    let link = subsystem_status::update_execution_status(
        state.store.as_ref(),
        rfc_id,
        subsystem_id,
        request.status,
        &user,
    )?;
    Ok(Json(link))
}

/// Create the subsystem status routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/:rfc_id/subsystems/:subsystem_id/confirmation-status",
            patch(update_confirmation_status),
        )
        .route(
            "/:rfc_id/subsystems/:subsystem_id/execution-status",
            patch(update_execution_status),
        )
}
