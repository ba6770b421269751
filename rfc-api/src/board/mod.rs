//! External kanban board integration
//!
//! `client` holds the thin HTTP wrappers over the board API; `sync` holds
//! the status-to-list mapping and the RFC-to-card synchronization logic.

pub mod client;
pub mod sync;

pub use client::{BoardClient, BoardList, CardRequest, CardResponse, DEFAULT_CARD_POSITION};
pub use sync::{list_names_for_status, status_for_list_name, BoardGateway};
