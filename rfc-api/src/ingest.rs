//! Webhook ingestion
//!
//! Translates board events into local state mutations. Resolution is
//! best-effort: an event that names no known RFC is logged and dropped,
//! never an error. Status moves performed by humans on the board are
//! authoritative and bypass the terminal-state guard the derivation job
//! honors.

use crate::board::status_for_list_name;
use crate::error::ApiResult;
use crate::services::rfc::snapshot_of;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use rfc_core::{new_entity_id, EntityId, HistoryOperation, Rfc, RfcStatus, Urgency};
use rfc_storage::{RfcUpdate, StorageTrait};
use serde::Deserialize;

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Closed enumeration of the board events this service understands.
/// The camelCase aliases are the board's native action names; the
/// snake_case forms are what its webhook extension emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEventKind {
    CardCreated,
    CardUpdated,
    CardMoved,
    CardDeleted,
    RfcStatusChanged,
}

impl BoardEventKind {
    /// Parse a declared event type. Unknown types resolve to `None` and
    /// are ignored by the dispatcher.
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "card_created" | "cardCreate" => Some(Self::CardCreated),
            "card_updated" | "cardUpdate" => Some(Self::CardUpdated),
            "card_moved" | "cardMove" => Some(Self::CardMoved),
            "card_deleted" | "cardDelete" => Some(Self::CardDeleted),
            "rfc_status_changed" => Some(Self::RfcStatusChanged),
            _ => None,
        }
    }
}

// ============================================================================
// PAYLOAD TYPES
// ============================================================================

/// Inbound webhook envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: Option<WebhookData>,
    #[serde(default, rename = "prevData")]
    pub prev_data: Option<WebhookData>,
    /// The board sends the acting user at the top level of the payload.
    #[serde(default)]
    pub user: Option<WebhookUser>,
    #[serde(default)]
    pub source: Option<String>,
}

impl WebhookPayload {
    /// The acting user: top-level `user`, falling back to the legacy
    /// `data.movedBy` location.
    pub fn effective_user(&self) -> Option<&WebhookUser> {
        self.user
            .as_ref()
            .or_else(|| self.data.as_ref().and_then(|d| d.moved_by.as_ref()))
    }
}

/// Event data. The board emits two shapes: flat fields, or the raw entity
/// nested under `item`. Accessors prefer the flat field and fall back to
/// `item`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookData {
    pub item: Option<serde_json::Value>,
    pub card_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub list_id: Option<String>,
    pub list_name: Option<String>,
    pub board_id: Option<String>,
    pub previous_list_id: Option<String>,
    pub previous_list_name: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub rfc_data: Option<RfcData>,
    pub moved_by: Option<WebhookUser>,
}

impl WebhookData {
    fn item_str(&self, key: &str) -> Option<String> {
        self.item
            .as_ref()
            .and_then(|item| item.get(key))
            .and_then(|value| value.as_str())
            .map(String::from)
    }

    pub fn card_id(&self) -> Option<String> {
        self.card_id.clone().or_else(|| self.item_str("id"))
    }

    pub fn list_id(&self) -> Option<String> {
        self.list_id.clone().or_else(|| self.item_str("listId"))
    }

    pub fn card_name(&self) -> Option<String> {
        self.name.clone().or_else(|| self.item_str("name"))
    }
}

/// Embedded RFC reference carried by cards the workflow created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RfcData {
    pub external_rfc_id: Option<i64>,
    pub status: Option<String>,
    pub urgency: Option<String>,
    pub implementation_date: Option<DateTime<Utc>>,
}

/// Board-side user identity attached to an event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Route an event to its handler. Unknown event types are logged and
/// acknowledged.
pub async fn dispatch(state: &AppState, payload: &WebhookPayload) -> ApiResult<()> {
    let Some(kind) = BoardEventKind::parse(&payload.event) else {
        tracing::debug!(event = %payload.event, "Unhandled webhook event type");
        return Ok(());
    };

    match kind {
        BoardEventKind::CardCreated => handle_card_created(state, payload),
        BoardEventKind::CardUpdated => handle_card_updated(state, payload).await,
        BoardEventKind::CardMoved | BoardEventKind::RfcStatusChanged => {
            handle_card_moved(state, payload).await
        }
        BoardEventKind::CardDeleted => handle_card_deleted(state, payload),
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// A card appeared on the board. With an embedded RFC reference this binds
/// the card to the existing RFC; without one, the card was authored
/// directly on the board and originates a new RFC.
pub fn handle_card_created(state: &AppState, payload: &WebhookPayload) -> ApiResult<()> {
    let Some(data) = &payload.data else {
        return Ok(());
    };
    let card_id = data.card_id();

    if let Some(number) = data.rfc_data.as_ref().and_then(|r| r.external_rfc_id) {
        let Some(rfc) = state.store.rfc_find_by_number(number)? else {
            tracing::warn!(number, "Card created for unknown RFC number");
            return Ok(());
        };
        let Some(card_id) = card_id else {
            return Ok(());
        };
        if rfc.board_card_id.as_deref() == Some(card_id.as_str()) {
            return Ok(());
        }
        tracing::info!(rfc_id = %rfc.id, %card_id, "Binding board card to existing RFC");
        state.store.rfc_update(
            rfc.id,
            RfcUpdate {
                board_card_id: Some(Some(card_id)),
                ..RfcUpdate::default()
            },
        )?;
        return Ok(());
    }

    let (Some(card_id), Some(title)) = (card_id, data.card_name()) else {
        tracing::debug!("Card created event without card id or name, skipping");
        return Ok(());
    };

    if state.store.rfc_find_by_card_id(&card_id)?.is_some() {
        return Ok(());
    }

    let Some(requester_id) = lookup_board_user(state.store.as_ref(), payload.effective_user())?
    else {
        tracing::warn!(%card_id, "Cannot originate RFC from board card: no local user matches the author");
        return Ok(());
    };

    let status = data
        .list_name
        .as_deref()
        .and_then(status_for_list_name)
        .unwrap_or(RfcStatus::New);

    let now = Utc::now();
    let rfc = Rfc {
        id: new_entity_id(),
        number: state.store.rfc_next_number(),
        title,
        description: data.description.clone(),
        urgency: Urgency::Planned,
        status,
        implementation_date: data
            .due_date
            .or_else(|| data.rfc_data.as_ref().and_then(|r| r.implementation_date))
            .unwrap_or(now),
        requester_id,
        board_card_id: Some(card_id.clone()),
        board_status_changed_at: Some(now),
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    state.store.rfc_insert(&rfc)?;
    let snapshot = snapshot_of(state.store.as_ref(), &rfc, HistoryOperation::Create, requester_id)?;
    state.store.snapshot_append(&snapshot)?;

    tracing::info!(rfc_id = %rfc.id, %card_id, "RFC originated from board card");
    Ok(())
}

/// A card moved between lists: the destination list's display name names
/// the new status. Human moves are authoritative, so this applies even to
/// terminal RFCs.
pub async fn handle_card_moved(state: &AppState, payload: &WebhookPayload) -> ApiResult<()> {
    let Some(data) = &payload.data else {
        return Ok(());
    };

    let Some(list_name) = resolve_list_name(state, data).await else {
        tracing::debug!("Card moved without resolvable list name");
        return Ok(());
    };

    let Some(new_status) = status_for_list_name(&list_name) else {
        tracing::debug!(%list_name, "Unknown list name, cannot determine status");
        return Ok(());
    };

    let Some(rfc) = resolve_rfc(state.store.as_ref(), data)? else {
        tracing::warn!(card_id = ?data.card_id(), "RFC not found for card move");
        return Ok(());
    };

    if rfc.status == new_status {
        return Ok(());
    }

    apply_board_status_change(state, rfc, new_status, payload).await
}

/// A card's fields changed. A list change embedded in the payload is
/// treated as a move; otherwise title/description/urgency/target-date are
/// patched, with invalid enum values logged and skipped.
pub async fn handle_card_updated(state: &AppState, payload: &WebhookPayload) -> ApiResult<()> {
    let Some(data) = &payload.data else {
        return Ok(());
    };

    let Some(rfc) = resolve_rfc(state.store.as_ref(), data)? else {
        tracing::debug!(card_id = ?data.card_id(), "Card update for a card not linked to any RFC");
        return Ok(());
    };

    if data.list_id().is_some() || data.list_name.is_some() {
        if let Some(list_name) = resolve_list_name(state, data).await {
            if let Some(new_status) = status_for_list_name(&list_name) {
                if new_status != rfc.status {
                    return apply_board_status_change(state, rfc, new_status, payload).await;
                }
            }
        }
    }

    let mut updated = rfc.clone();
    let mut changed = false;

    if let Some(title) = data.card_name() {
        if !title.is_empty() && title != updated.title {
            changed = true;
            updated.title = title;
        }
    }
    if let Some(description) = &data.description {
        if updated.description.as_deref() != Some(description.as_str()) {
            changed = true;
            updated.description = Some(description.clone());
        }
    }
    if let Some(raw) = data.rfc_data.as_ref().and_then(|r| r.urgency.as_deref()) {
        match Urgency::from_db_str(raw) {
            Ok(urgency) if urgency != updated.urgency => {
                changed = true;
                updated.urgency = urgency;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Skipping unparseable urgency from webhook"),
        }
    }
    if let Some(due_date) = data.due_date {
        if due_date != updated.implementation_date {
            changed = true;
            updated.implementation_date = due_date;
        }
    }

    if !changed {
        return Ok(());
    }

    let actor = resolve_actor(state.store.as_ref(), payload.effective_user(), &rfc)?;
    updated.updated_at = Utc::now();

    let snapshot = snapshot_of(state.store.as_ref(), &updated, HistoryOperation::Update, actor)?;
    state.store.record_rfc_change(&updated, Some(snapshot))?;

    tracing::info!(rfc_id = %rfc.id, "RFC fields patched from board card");
    Ok(())
}

/// A card was deleted on the board. The board is not the source of truth,
/// so the RFC survives; only the card binding is cleared.
pub fn handle_card_deleted(state: &AppState, payload: &WebhookPayload) -> ApiResult<()> {
    let Some(data) = &payload.data else {
        return Ok(());
    };

    let Some(rfc) = resolve_rfc(state.store.as_ref(), data)? else {
        tracing::debug!(card_id = ?data.card_id(), "Deleted card was not linked to any RFC");
        return Ok(());
    };

    tracing::info!(rfc_id = %rfc.id, "Board card deleted, unbinding from RFC");
    state.store.rfc_update(
        rfc.id,
        RfcUpdate {
            board_card_id: Some(None),
            ..RfcUpdate::default()
        },
    )?;
    Ok(())
}

// ============================================================================
// RESOLUTION HELPERS
// ============================================================================

/// Best-effort RFC resolution: bound card id first, then the embedded
/// external RFC number.
fn resolve_rfc(store: &dyn StorageTrait, data: &WebhookData) -> ApiResult<Option<Rfc>> {
    if let Some(card_id) = data.card_id() {
        if let Some(rfc) = store.rfc_find_by_card_id(&card_id)? {
            return Ok(Some(rfc));
        }
    }

    if let Some(number) = data.rfc_data.as_ref().and_then(|r| r.external_rfc_id) {
        if let Some(rfc) = store.rfc_find_by_number(number)? {
            return Ok(Some(rfc));
        }
    }

    Ok(None)
}

/// The destination list name, from the payload or by asking the board for
/// the list behind the payload's list id.
async fn resolve_list_name(state: &AppState, data: &WebhookData) -> Option<String> {
    if let Some(name) = &data.list_name {
        return Some(name.clone());
    }
    let list_id = data.list_id()?;
    state.board.list_name_by_id(&list_id).await
}

/// Map the board-side user onto a local account: board user id first, then
/// email, then username. A hit by email or username back-fills the board
/// user id for future events.
fn lookup_board_user(
    store: &dyn StorageTrait,
    user: Option<&WebhookUser>,
) -> ApiResult<Option<EntityId>> {
    let Some(user) = user else {
        return Ok(None);
    };

    if let Some(board_id) = user.id.as_deref().filter(|s| !s.is_empty()) {
        if let Some(found) = store.user_find_by_board_id(board_id)? {
            return Ok(Some(found.id));
        }
    }

    for found in [
        user.email
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|email| store.user_find_by_email(email))
            .transpose()?
            .flatten(),
        user.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|username| store.user_find_by_username(username))
            .transpose()?
            .flatten(),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(board_id) = user.id.clone().filter(|s| !s.is_empty()) {
            if found.board_user_id.is_none() {
                store.user_set_board_id(found.id, board_id)?;
                tracing::info!(user_id = %found.id, "Bound board account to local user");
            }
        }
        return Ok(Some(found.id));
    }

    tracing::warn!(
        board_user_id = ?user.id,
        email = ?user.email,
        username = ?user.username,
        "Board user does not match any local account"
    );
    Ok(None)
}

/// The actor to attribute a change to, falling back to the RFC's requester
/// when the board user cannot be mapped.
fn resolve_actor(
    store: &dyn StorageTrait,
    user: Option<&WebhookUser>,
    rfc: &Rfc,
) -> ApiResult<EntityId> {
    if let Some(actor) = lookup_board_user(store, user)? {
        return Ok(actor);
    }
    tracing::warn!(rfc_id = %rfc.id, "Attributing board change to the RFC requester");
    Ok(rfc.requester_id)
}

/// Apply a board-originated status change: stamp the debounce marker,
/// persist status and snapshot as one unit.
async fn apply_board_status_change(
    state: &AppState,
    rfc: Rfc,
    new_status: RfcStatus,
    payload: &WebhookPayload,
) -> ApiResult<()> {
    let actor = resolve_actor(state.store.as_ref(), payload.effective_user(), &rfc)?;
    let old_status = rfc.status;
    let now = Utc::now();

    let mut updated = rfc;
    updated.status = new_status;
    updated.board_status_changed_at = Some(now);
    updated.updated_at = now;

    let snapshot = snapshot_of(
        state.store.as_ref(),
        &updated,
        HistoryOperation::StatusChange,
        actor,
    )?;
    state.store.record_rfc_change(&updated, Some(snapshot))?;

    tracing::info!(
        rfc_id = %updated.id,
        old_status = %old_status,
        new_status = %new_status,
        actor = %actor,
        "RFC status changed from board"
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
