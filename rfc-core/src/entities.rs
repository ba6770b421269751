//! Core entity structures

use crate::{
    ConfirmationStatus, EntityId, ExecutionStatus, HistoryOperation, RfcStatus, StatusAxis,
    Timestamp, Urgency, UserRole,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// RFC - the tracked change-request aggregate.
///
/// Owned by the workflow; mutated by users, the derivation job, and webhook
/// ingestion. `board_card_id` binds the RFC to its kanban card, and
/// `board_status_changed_at` records the last human board edit so the
/// derivation job can keep its hands off for a debounce window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfc {
    pub id: EntityId,
    /// Human-facing sequential number, referenced by board cards as the
    /// external RFC id.
    pub number: i64,
    pub title: String,
    pub description: Option<String>,
    pub urgency: Urgency,
    pub status: RfcStatus,
    pub implementation_date: Timestamp,
    pub requester_id: EntityId,
    pub board_card_id: Option<String>,
    pub board_status_changed_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Rfc {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Link between an RFC and one subsystem it impacts, owned by an executor.
/// Carries the two independent status axes. Lifecycle is tied to the RFC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedSubsystem {
    pub id: EntityId,
    pub rfc_id: EntityId,
    pub subsystem_id: EntityId,
    pub executor_id: EntityId,
    pub confirmation_status: ConfirmationStatus,
    pub execution_status: ExecutionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Per-approver yes/no record for an RFC. At most one live record per
/// (RFC, approver) pair; upserted on each approve/unapprove action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub id: EntityId,
    pub rfc_id: EntityId,
    pub approver_id: EntityId,
    pub approved: bool,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Immutable record of a single subsystem status-field transition.
/// Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    pub id: EntityId,
    pub affected_subsystem_id: EntityId,
    pub axis: StatusAxis,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_by: EntityId,
    pub created_at: Timestamp,
}

/// Immutable full-field snapshot of an RFC taken on create/update/status
/// change, plus the attachment and affected-subsystem id-sets active at
/// that moment. Used only for diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfcSnapshot {
    pub id: EntityId,
    pub rfc_id: EntityId,
    pub operation: HistoryOperation,
    pub changed_by: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub urgency: Urgency,
    pub status: RfcStatus,
    pub implementation_date: Timestamp,
    pub attachment_ids: BTreeSet<EntityId>,
    pub affected_subsystem_ids: BTreeSet<EntityId>,
    pub created_at: Timestamp,
}

/// User record, as far as the workflow needs it. Identity-provider sync is
/// a collaborator concern; `board_user_id` links a user to their kanban
/// account for webhook attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub board_user_id: Option<String>,
}

/// A system grouping subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub id: EntityId,
    pub name: String,
}

/// A subsystem that an RFC can impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsystem {
    pub id: EntityId,
    pub system_id: EntityId,
    pub name: String,
}

/// Attachment metadata, looked up for history enrichment only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: EntityId,
    pub rfc_id: EntityId,
    pub original_filename: String,
}
