//! Shared application state for the HTTP layer

use crate::board::BoardGateway;
use rfc_storage::StorageTrait;
use std::sync::Arc;

/// State handed to every route handler and to the status refresh job.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StorageTrait>,
    pub board: Arc<BoardGateway>,
}

impl AppState {
    pub fn new(store: Arc<dyn StorageTrait>, board: Arc<BoardGateway>) -> Self {
        Self { store, board }
    }
}
