//! Audit timeline reconstruction
//!
//! Builds a unified, time-ordered audit feed for one RFC by diffing its
//! consecutive snapshots along three independent axes (scalar fields,
//! attachment set, affected-subsystem set) and merging in the subsystem
//! status-change records. The merge happens in memory, so pagination is
//! applied manually over the sorted event list.

use crate::{EntityId, HistoryOperation, RfcSnapshot, StatusAxis, StatusChangeRecord, Timestamp};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Who performed a change, with the display name resolved at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorInfo {
    pub id: EntityId,
    pub name: String,
}

/// Attachment display info for added/removed lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentInfo {
    pub id: EntityId,
    pub original_filename: String,
}

/// Denormalized subsystem-link display info.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsystemInfo {
    /// Affected-subsystem link id.
    pub id: EntityId,
    pub subsystem_id: EntityId,
    pub subsystem_name: String,
    pub system_name: String,
    pub executor_id: EntityId,
    pub executor_name: String,
}

/// One field's old/new pair inside a fields-changed event.
/// `old_value` is `None` for every field of the creation event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// A single entry of the unified audit timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEvent {
    pub timestamp: Timestamp,
    pub actor: ActorInfo,
    #[serde(flatten)]
    pub kind: HistoryEventKind,
}

/// Event payloads, tagged for the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventKind {
    RfcFieldsChanged {
        operation: HistoryOperation,
        changes: BTreeMap<String, FieldChange>,
    },
    RfcAttachmentsChanged {
        added: Vec<AttachmentInfo>,
        removed: Vec<AttachmentInfo>,
    },
    RfcSubsystemsChanged {
        added: Vec<SubsystemInfo>,
        removed: Vec<SubsystemInfo>,
    },
    SubsystemStatusChanged {
        subsystem: SubsystemInfo,
        axis: StatusAxis,
        old_status: Option<String>,
        new_status: String,
    },
}

// ============================================================================
// RESOLUTION CONTEXT
// ============================================================================

/// Display-name lookup maps, resolved by the caller before reconstruction
/// so the diffing itself stays pure.
#[derive(Debug, Clone, Default)]
pub struct HistoryContext {
    pub users: HashMap<EntityId, ActorInfo>,
    pub attachments: HashMap<EntityId, AttachmentInfo>,
    /// Keyed by affected-subsystem link id.
    pub subsystems: HashMap<EntityId, SubsystemInfo>,
}

impl HistoryContext {
    fn actor(&self, id: EntityId) -> ActorInfo {
        self.users.get(&id).cloned().unwrap_or(ActorInfo {
            id,
            name: id.to_string(),
        })
    }

    fn attachment_infos(&self, ids: impl IntoIterator<Item = EntityId>) -> Vec<AttachmentInfo> {
        ids.into_iter()
            .filter_map(|id| self.attachments.get(&id).cloned())
            .collect()
    }

    fn subsystem_infos(&self, ids: impl IntoIterator<Item = EntityId>) -> Vec<SubsystemInfo> {
        ids.into_iter()
            .filter_map(|id| self.subsystems.get(&id).cloned())
            .collect()
    }
}

// ============================================================================
// RECONSTRUCTION
// ============================================================================

/// Rebuild the unified audit timeline for one RFC.
///
/// `snapshots` is the full snapshot list for the RFC; `records` holds every
/// subsystem status transition whose link id was ever referenced by a
/// snapshot. The result is sorted newest-first.
pub fn reconstruct_events(
    snapshots: &[RfcSnapshot],
    records: &[StatusChangeRecord],
    ctx: &HistoryContext,
) -> Vec<HistoryEvent> {
    let mut ordered: Vec<&RfcSnapshot> = snapshots.iter().collect();
    ordered.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

    let mut events = Vec::new();

    for (i, snapshot) in ordered.iter().enumerate() {
        let actor = ctx.actor(snapshot.changed_by);

        if i == 0 {
            events.push(HistoryEvent {
                timestamp: snapshot.created_at,
                actor,
                kind: HistoryEventKind::RfcFieldsChanged {
                    operation: snapshot.operation,
                    changes: creation_changes(snapshot),
                },
            });
            continue;
        }

        let previous = ordered[i - 1];

        let changes = fields_diff(previous, snapshot);
        if !changes.is_empty() {
            events.push(HistoryEvent {
                timestamp: snapshot.created_at,
                actor: actor.clone(),
                kind: HistoryEventKind::RfcFieldsChanged {
                    operation: snapshot.operation,
                    changes,
                },
            });
        }

        let (added, removed) = set_diff(&previous.attachment_ids, &snapshot.attachment_ids);
        if !added.is_empty() || !removed.is_empty() {
            events.push(HistoryEvent {
                timestamp: snapshot.created_at,
                actor: actor.clone(),
                kind: HistoryEventKind::RfcAttachmentsChanged {
                    added: ctx.attachment_infos(added),
                    removed: ctx.attachment_infos(removed),
                },
            });
        }

        let (added, removed) = set_diff(
            &previous.affected_subsystem_ids,
            &snapshot.affected_subsystem_ids,
        );
        if !added.is_empty() || !removed.is_empty() {
            events.push(HistoryEvent {
                timestamp: snapshot.created_at,
                actor,
                kind: HistoryEventKind::RfcSubsystemsChanged {
                    added: ctx.subsystem_infos(added),
                    removed: ctx.subsystem_infos(removed),
                },
            });
        }
    }

    for record in records {
        // Links that no longer resolve carry no display names; drop them.
        let Some(subsystem) = ctx.subsystems.get(&record.affected_subsystem_id) else {
            continue;
        };

        events.push(HistoryEvent {
            timestamp: record.created_at,
            actor: ctx.actor(record.changed_by),
            kind: HistoryEventKind::SubsystemStatusChanged {
                subsystem: subsystem.clone(),
                axis: record.axis,
                old_status: record.old_status.clone(),
                new_status: record.new_status.clone(),
            },
        });
    }

    // Newest first; stable sort keeps same-instant events in insert order.
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

/// Manual offset/limit pagination over the in-memory sorted list.
pub fn paginate(events: &[HistoryEvent], offset: usize, limit: usize) -> &[HistoryEvent] {
    let start = offset.min(events.len());
    let end = offset.saturating_add(limit).min(events.len());
    &events[start..end]
}

fn creation_changes(snapshot: &RfcSnapshot) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    for (field, value) in tracked_fields(snapshot) {
        changes.insert(
            field.to_string(),
            FieldChange {
                old_value: None,
                new_value: value,
            },
        );
    }
    changes
}

fn fields_diff(previous: &RfcSnapshot, current: &RfcSnapshot) -> BTreeMap<String, FieldChange> {
    let old_fields: BTreeMap<&str, Option<String>> = tracked_fields(previous).into_iter().collect();

    let mut changes = BTreeMap::new();
    for (field, new_value) in tracked_fields(current) {
        let old_value = old_fields.get(field).cloned().flatten();
        if old_value != new_value {
            changes.insert(
                field.to_string(),
                FieldChange {
                    old_value,
                    new_value,
                },
            );
        }
    }
    changes
}

fn tracked_fields(snapshot: &RfcSnapshot) -> Vec<(&'static str, Option<String>)> {
    vec![
        ("title", Some(snapshot.title.clone())),
        ("description", snapshot.description.clone()),
        (
            "implementation_date",
            Some(snapshot.implementation_date.to_rfc3339()),
        ),
        ("urgency", Some(snapshot.urgency.to_string())),
        ("status", Some(snapshot.status.to_string())),
    ]
}

fn set_diff(previous: &BTreeSet<EntityId>, current: &BTreeSet<EntityId>) -> (Vec<EntityId>, Vec<EntityId>) {
    let added = current.difference(previous).copied().collect();
    let removed = previous.difference(current).copied().collect();
    (added, removed)
}

// =============================================================================
// TESTS
// =============================================================================
