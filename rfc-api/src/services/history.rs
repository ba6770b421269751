//! Unified audit history
//!
//! Resolves the display-name maps for one RFC (users, attachments,
//! subsystem links), hands them with the snapshots and status records to
//! the core reconstruction, and paginates the sorted result in memory.

use crate::error::{ApiError, ApiResult};
use rfc_core::{
    paginate, reconstruct_events, ActorInfo, AttachmentInfo, EntityId, HistoryContext,
    HistoryEvent, SubsystemInfo,
};
use rfc_storage::StorageTrait;
use serde::Serialize;
use std::collections::BTreeSet;

/// One page of the audit timeline, newest events first.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub events: Vec<HistoryEvent>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Rebuild and paginate the audit timeline for an RFC.
pub fn get_history(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    offset: usize,
    limit: usize,
) -> ApiResult<HistoryPage> {
    tracing::info!(%rfc_id, offset, limit, "Reconstructing RFC history");

    if store.rfc_get(rfc_id)?.is_none() {
        return Err(ApiError::rfc_not_found(rfc_id));
    }

    let snapshots = store.snapshot_list_by_rfc(rfc_id)?;

    // Every link id any snapshot ever referenced, current or not.
    let link_ids: BTreeSet<EntityId> = snapshots
        .iter()
        .flat_map(|s| s.affected_subsystem_ids.iter().copied())
        .collect();
    let link_ids: Vec<EntityId> = link_ids.into_iter().collect();

    let records = store.status_record_list_by_links(&link_ids)?;

    let ctx = build_context(store, &snapshots, &records, &link_ids)?;
    let events = reconstruct_events(&snapshots, &records, &ctx);
    let page = paginate(&events, offset, limit).to_vec();

    Ok(HistoryPage {
        total: events.len(),
        events: page,
        offset,
        limit,
    })
}

fn build_context(
    store: &dyn StorageTrait,
    snapshots: &[rfc_core::RfcSnapshot],
    records: &[rfc_core::StatusChangeRecord],
    link_ids: &[EntityId],
) -> ApiResult<HistoryContext> {
    let mut ctx = HistoryContext::default();

    let mut user_ids: BTreeSet<EntityId> = snapshots.iter().map(|s| s.changed_by).collect();
    user_ids.extend(records.iter().map(|r| r.changed_by));

    for link_id in link_ids {
        let Some(link) = store.link_get(*link_id)? else {
            continue;
        };
        user_ids.insert(link.executor_id);

        let subsystem = store.subsystem_get(link.subsystem_id)?;
        let system = match &subsystem {
            Some(s) => store.system_get(s.system_id)?,
            None => None,
        };
        let executor = store.user_get(link.executor_id)?;

        ctx.subsystems.insert(
            *link_id,
            SubsystemInfo {
                id: *link_id,
                subsystem_id: link.subsystem_id,
                subsystem_name: subsystem
                    .map(|s| s.name)
                    .unwrap_or_else(|| link.subsystem_id.to_string()),
                system_name: system.map(|s| s.name).unwrap_or_default(),
                executor_id: link.executor_id,
                executor_name: executor.map(|u| u.full_name).unwrap_or_default(),
            },
        );
    }

    let attachment_ids: BTreeSet<EntityId> = snapshots
        .iter()
        .flat_map(|s| s.attachment_ids.iter().copied())
        .collect();
    for attachment_id in attachment_ids {
        if let Some(attachment) = store.attachment_get(attachment_id)? {
            ctx.attachments.insert(
                attachment_id,
                AttachmentInfo {
                    id: attachment_id,
                    original_filename: attachment.original_filename,
                },
            );
        }
    }

    for user_id in user_ids {
        if let Some(user) = store.user_get(user_id)? {
            ctx.users.insert(
                user_id,
                ActorInfo {
                    id: user_id,
                    name: user.full_name,
                },
            );
        }
    }

    Ok(ctx)
}

// =============================================================================
// TESTS
// =============================================================================
