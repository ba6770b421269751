//! Approval Routes
//!
//! Approve/unapprove an RFC as a whole. Requires an approver-class role.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use rfc_core::Approval;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::approval;
use crate::state::AppState;

/// Request body for approve/unapprove.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

/// PUT /api/rfcs/:rfc_id/approve
pub async fn approve_rfc(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ApprovalRequest>,
) -> ApiResult<Json<Approval>> {
    let approval =
        approval::set_approval(state.store.as_ref(), rfc_id, &user, true, request.comment)?;
    Ok(Json(approval))
}

/// PUT /api/rfcs/:rfc_id/unapprove
pub async fn unapprove_rfc(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ApprovalRequest>,
) -> ApiResult<Json<Approval>> {
    let approval =
        approval::set_approval(state.store.as_ref(), rfc_id, &user, false, request.comment)?;
    Ok(Json(approval))
}

/// GET /api/rfcs/:rfc_id/approvals
pub async fn list_approvals(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Approval>>> {
    let approvals = approval::list_approvals(state.store.as_ref(), rfc_id)?;
    Ok(Json(approvals))
}

/// Create the approval routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/:rfc_id/approve", put(approve_rfc))
        .route("/:rfc_id/unapprove", put(unapprove_rfc))
        .route("/:rfc_id/approvals", get(list_approvals))
}
