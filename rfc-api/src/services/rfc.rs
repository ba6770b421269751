//! RFC write path
//!
//! Create, update, and soft-delete an RFC, capturing an immutable snapshot
//! on every mutation. Snapshots record the scalar fields plus the
//! attachment and subsystem id-sets active at that moment; the history
//! reconstruction diffs them later. Board sync happens after the local
//! write, in the route layer, so a sync failure never rolls anything back.

use crate::error::{ApiError, ApiResult};
use rfc_core::{
    new_entity_id, AffectedSubsystem, ConfirmationStatus, EntityId, ExecutionStatus,
    HistoryOperation, Rfc, RfcResult, RfcSnapshot, RfcStatus, Timestamp, Urgency, User,
};
use rfc_storage::{RfcUpdate, StorageTrait};
use serde::Deserialize;
use std::collections::BTreeSet;

// ============================================================================
// INPUT TYPES
// ============================================================================

/// One subsystem impacted by the RFC, with its designated executor.
#[derive(Debug, Clone, Deserialize)]
pub struct SubsystemAssignment {
    pub subsystem_id: EntityId,
    pub executor_id: EntityId,
}

/// Request body for creating an RFC.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRfcInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    pub implementation_date: Timestamp,
    #[serde(default)]
    pub subsystems: Vec<SubsystemAssignment>,
}

/// Request body for updating an RFC. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRfcInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub implementation_date: Option<Timestamp>,
    #[serde(default)]
    pub subsystems: Option<Vec<SubsystemAssignment>>,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Create an RFC with its subsystem links and the CREATE snapshot.
pub fn create_rfc(
    store: &dyn StorageTrait,
    input: CreateRfcInput,
    requester: &User,
) -> ApiResult<Rfc> {
    if input.title.trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }

    let now = chrono::Utc::now();
    let rfc = Rfc {
        id: new_entity_id(),
        number: store.rfc_next_number(),
        title: input.title,
        description: input.description,
        urgency: input.urgency,
        status: RfcStatus::New,
        implementation_date: input.implementation_date,
        requester_id: requester.id,
        board_card_id: None,
        board_status_changed_at: None,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    store.rfc_insert(&rfc)?;
    tracing::info!(rfc_id = %rfc.id, number = rfc.number, "RFC created");

    for assignment in &input.subsystems {
        insert_link(store, rfc.id, assignment)?;
    }

    let snapshot = snapshot_of(store, &rfc, HistoryOperation::Create, requester.id)?;
    store.snapshot_append(&snapshot)?;

    Ok(rfc)
}

/// Update an RFC's fields and subsystem set, appending an UPDATE snapshot.
pub fn update_rfc(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    input: UpdateRfcInput,
    actor: &User,
) -> ApiResult<Rfc> {
    let rfc = get_live_rfc(store, rfc_id)?;

    store.rfc_update(
        rfc.id,
        RfcUpdate {
            title: input.title,
            description: input.description,
            urgency: input.urgency,
            implementation_date: input.implementation_date,
            ..RfcUpdate::default()
        },
    )?;

    if let Some(assignments) = input.subsystems {
        reconcile_links(store, rfc.id, &assignments)?;
    }

    let updated = get_live_rfc(store, rfc_id)?;
    let snapshot = snapshot_of(store, &updated, HistoryOperation::Update, actor.id)?;
    store.snapshot_append(&snapshot)?;

    tracing::info!(rfc_id = %rfc.id, "RFC updated");
    Ok(updated)
}

/// Soft-delete an RFC. Returns the record so the caller can also remove
/// the bound board card, best-effort.
pub fn delete_rfc(store: &dyn StorageTrait, rfc_id: EntityId) -> ApiResult<Rfc> {
    let rfc = get_live_rfc(store, rfc_id)?;

    store.rfc_update(
        rfc.id,
        RfcUpdate {
            deleted_at: Some(chrono::Utc::now()),
            ..RfcUpdate::default()
        },
    )?;

    tracing::info!(rfc_id = %rfc.id, "RFC soft-deleted");
    Ok(rfc)
}

/// Fetch a non-deleted RFC.
pub fn get_live_rfc(store: &dyn StorageTrait, rfc_id: EntityId) -> ApiResult<Rfc> {
    store
        .rfc_get(rfc_id)?
        .filter(|rfc| !rfc.is_deleted())
        .ok_or_else(|| ApiError::rfc_not_found(rfc_id))
}

/// Capture the RFC's current state, including the live attachment and
/// subsystem id-sets, as an immutable snapshot.
pub fn snapshot_of(
    store: &dyn StorageTrait,
    rfc: &Rfc,
    operation: HistoryOperation,
    changed_by: EntityId,
) -> RfcResult<RfcSnapshot> {
    let attachment_ids: BTreeSet<EntityId> = store
        .attachment_list_by_rfc(rfc.id)?
        .into_iter()
        .map(|a| a.id)
        .collect();

    let affected_subsystem_ids: BTreeSet<EntityId> = store
        .link_list_by_rfc(rfc.id)?
        .into_iter()
        .map(|l| l.id)
        .collect();

    Ok(RfcSnapshot {
        id: new_entity_id(),
        rfc_id: rfc.id,
        operation,
        changed_by,
        title: rfc.title.clone(),
        description: rfc.description.clone(),
        urgency: rfc.urgency,
        status: rfc.status,
        implementation_date: rfc.implementation_date,
        attachment_ids,
        affected_subsystem_ids,
        created_at: chrono::Utc::now(),
    })
}

fn insert_link(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    assignment: &SubsystemAssignment,
) -> ApiResult<AffectedSubsystem> {
    if store.subsystem_get(assignment.subsystem_id)?.is_none() {
        return Err(ApiError::subsystem_not_found(assignment.subsystem_id));
    }
    if store.user_get(assignment.executor_id)?.is_none() {
        return Err(ApiError::new(
            crate::error::ErrorCode::UserNotFound,
            format!("Executor not found: {}", assignment.executor_id),
        ));
    }

    let now = chrono::Utc::now();
    let link = AffectedSubsystem {
        id: new_entity_id(),
        rfc_id,
        subsystem_id: assignment.subsystem_id,
        executor_id: assignment.executor_id,
        confirmation_status: ConfirmationStatus::Pending,
        execution_status: ExecutionStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    store.link_insert(&link)?;
    Ok(link)
}

/// Bring the RFC's link set in line with the requested assignments: links
/// for subsystems no longer named are removed, new subsystems get fresh
/// pending links, and existing links keep their statuses.
fn reconcile_links(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    assignments: &[SubsystemAssignment],
) -> ApiResult<()> {
    let existing = store.link_list_by_rfc(rfc_id)?;

    for link in &existing {
        let still_wanted = assignments
            .iter()
            .any(|a| a.subsystem_id == link.subsystem_id);
        if !still_wanted {
            store.link_remove(link.id)?;
        }
    }

    for assignment in assignments {
        let already_linked = existing
            .iter()
            .any(|l| l.subsystem_id == assignment.subsystem_id);
        if !already_linked {
            insert_link(store, rfc_id, assignment)?;
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
