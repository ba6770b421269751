//! History Routes
//!
//! The unified audit timeline, reconstructed in memory and paginated
//! manually over the sorted event list.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::services::history::{self, HistoryPage};
use crate::state::AppState;

fn default_limit() -> usize {
    20
}

/// Query parameters for the history page.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// GET /api/rfcs/:rfc_id/history?offset=&limit=
pub async fn get_rfc_history(
    State(state): State<AppState>,
    Path(rfc_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryPage>> {
    let page = history::get_history(state.store.as_ref(), rfc_id, query.offset, query.limit)?;
    Ok(Json(page))
}

/// Create the history routes router.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/:rfc_id/history", get(get_rfc_history))
}
