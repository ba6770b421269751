//! RFC-to-board synchronization
//!
//! Holds the status-to-list-name mapping (both directions) and the logic
//! that projects an RFC onto its kanban card. List names are matched
//! case-insensitively against a fixed synonym table; the table must stay
//! exactly as shipped for interoperability with localized board setups.

use crate::board::client::{BoardClient, CardRequest, DEFAULT_CARD_POSITION};
use crate::config::BoardConfig;
use crate::error::ApiResult;
use once_cell::sync::Lazy;
use rfc_core::{Rfc, RfcStatus};
use rfc_storage::{RfcUpdate, StorageTrait};
use std::collections::HashMap;

// ============================================================================
// STATUS <-> LIST NAME MAPPING
// ============================================================================

/// Acceptable list names per status, in lookup priority order.
pub fn list_names_for_status(status: RfcStatus) -> &'static [&'static str] {
    match status {
        RfcStatus::New => &[
            "Новый",
            "Новые",
            "New",
            "Новые запросы",
            "New Requests",
            "Backlog",
        ],
        RfcStatus::UnderReview => &["На рассмотрении", "Under Review", "Review", "In Review"],
        RfcStatus::Approved => &["Одобрен", "Утверждено", "Approved", "Ready"],
        RfcStatus::Implemented => &["Внедрен", "Выполнено", "Implemented", "Done", "Completed"],
        RfcStatus::Rejected => &["Отклонен", "Отклонено", "Rejected", "Cancelled"],
    }
}

static LIST_NAME_TO_STATUS: Lazy<HashMap<String, RfcStatus>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for status in [
        RfcStatus::New,
        RfcStatus::UnderReview,
        RfcStatus::Approved,
        RfcStatus::Implemented,
        RfcStatus::Rejected,
    ] {
        for name in list_names_for_status(status) {
            map.insert(name.to_lowercase(), status);
        }
    }
    map
});

/// Inverse lookup: list display name -> status, case-insensitive.
pub fn status_for_list_name(name: &str) -> Option<RfcStatus> {
    LIST_NAME_TO_STATUS.get(&name.to_lowercase()).copied()
}

// ============================================================================
// GATEWAY
// ============================================================================

/// Outbound adapter translating RFC state into board card operations.
/// Every operation is best-effort: failures are logged and swallowed, and
/// the caller's local state change stands regardless.
pub struct BoardGateway {
    client: BoardClient,
    config: BoardConfig,
}

impl BoardGateway {
    pub fn new(config: BoardConfig) -> ApiResult<Self> {
        let client = BoardClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Whether the integration is switched on at all.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether RFC writes should push cards automatically.
    pub fn auto_sync(&self) -> bool {
        self.config.enabled && self.config.auto_sync
    }

    /// The shared secret expected on inbound webhooks, if configured.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.config.webhook_secret.as_deref()
    }

    /// Resolve the board list that represents a status. Walks the synonym
    /// table in priority order; absence is not an error.
    pub async fn find_list_id_for_status(&self, status: RfcStatus) -> Option<String> {
        let board_id = self.config.board_id.as_deref()?;

        for name in list_names_for_status(status) {
            if let Some(list_id) = self.client.find_list_id_by_name(board_id, name).await {
                return Some(list_id);
            }
        }

        tracing::warn!(status = %status, board_id, "No board list matches status");
        None
    }

    /// Resolve a list's display name by id, for webhook payloads that only
    /// carry the list id.
    pub async fn list_name_by_id(&self, list_id: &str) -> Option<String> {
        let board_id = self.config.board_id.as_deref()?;
        self.client
            .get_board_lists(board_id)
            .await
            .into_iter()
            .find(|list| list.id == list_id)
            .map(|list| list.name)
    }

    /// Project an RFC onto its card: create the card when none is bound
    /// (persisting the returned card id), otherwise update fields and move
    /// the card to the list matching current status. Creation and the
    /// status move stay separate calls - card creation does not guarantee
    /// placement in the correct list.
    pub async fn sync_rfc(&self, store: &dyn StorageTrait, rfc: &Rfc) {
        if !self.enabled() {
            tracing::debug!("Board integration is disabled, skipping sync");
            return;
        }

        tracing::info!(rfc_id = %rfc.id, "Syncing RFC to board");

        if let Some(card_id) = &rfc.board_card_id {
            let request = self.build_card_request(store, rfc);
            self.client.update_card(card_id, &request).await;
            self.move_card_for_status(rfc).await;
            return;
        }

        let Some(list_id) = self.find_list_id_for_status(rfc.status).await else {
            tracing::warn!(rfc_id = %rfc.id, status = %rfc.status, "Could not find list for status, card not created");
            return;
        };

        let request = self.build_card_request(store, rfc);
        let Some(card) = self.client.create_card(&list_id, &request).await else {
            return;
        };

        tracing::info!(rfc_id = %rfc.id, card_id = %card.id, "RFC card created on board");

        let update = RfcUpdate {
            board_card_id: Some(Some(card.id.clone())),
            ..RfcUpdate::default()
        };
        if let Err(e) = store.rfc_update(rfc.id, update) {
            tracing::error!(error = %e, rfc_id = %rfc.id, "Failed to persist board card binding");
        }
    }

    /// Move the RFC's bound card to the list matching its current status.
    /// Returns whether the move went through.
    pub async fn move_card_for_status(&self, rfc: &Rfc) -> bool {
        if !self.enabled() {
            return false;
        }
        let Some(card_id) = &rfc.board_card_id else {
            return false;
        };
        let Some(target_list_id) = self.find_list_id_for_status(rfc.status).await else {
            return false;
        };

        self.client
            .move_card(card_id, &target_list_id, None)
            .await
            .is_some()
    }

    /// Delete the card bound to a removed RFC.
    pub async fn delete_card(&self, card_id: &str) {
        if !self.enabled() {
            return;
        }
        self.client.delete_card(card_id).await;
    }

    /// Compose the card body from RFC metadata. Lookup failures degrade to
    /// a shorter description rather than aborting the sync.
    fn build_card_request(&self, store: &dyn StorageTrait, rfc: &Rfc) -> CardRequest {
        let mut body = String::new();
        if let Some(description) = &rfc.description {
            body.push_str(description);
            body.push_str("\n\n");
        }
        body.push_str("---\n");
        body.push_str(&format!("**RFC:** #{}\n", rfc.number));
        body.push_str(&format!("**Status:** {}\n", rfc.status));
        body.push_str(&format!("**Urgency:** {}\n", rfc.urgency));
        body.push_str(&format!(
            "**Implementation date:** {}\n",
            rfc.implementation_date.format("%Y-%m-%d")
        ));

        if let Ok(links) = store.link_list_by_rfc(rfc.id) {
            if !links.is_empty() {
                body.push_str("\n**Affected subsystems:**\n");
                for link in links {
                    let subsystem = store.subsystem_get(link.subsystem_id).ok().flatten();
                    let system = subsystem
                        .as_ref()
                        .and_then(|s| store.system_get(s.system_id).ok().flatten());
                    let executor = store.user_get(link.executor_id).ok().flatten();

                    let subsystem_name = subsystem
                        .map(|s| s.name)
                        .unwrap_or_else(|| link.subsystem_id.to_string());
                    let system_name = system.map(|s| s.name).unwrap_or_default();

                    body.push_str(&format!("- {} / {}", system_name, subsystem_name));
                    if let Some(executor) = executor {
                        body.push_str(&format!(" ({})", executor.full_name));
                    }
                    body.push('\n');
                }
            }
        }

        CardRequest {
            name: rfc.title.clone(),
            description: Some(body),
            position: Some(DEFAULT_CARD_POSITION),
            card_type: Some("project".to_string()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
