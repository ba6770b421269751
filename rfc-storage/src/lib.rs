//! RFC Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the storage abstraction for RFC workflow entities. The in-memory
//! implementation backs the service and the test suites; a SQL-backed
//! implementation would slot behind the same trait.
//!
//! Every trait method is atomic: the in-memory store holds all tables
//! behind a single lock, so the compound operations (`record_*`) give the
//! per-RFC transactional scoping the workflow relies on.

use rfc_core::{
    AffectedSubsystem, Approval, Attachment, ConfirmationStatus, EntityId, EntityKind,
    ExecutionStatus, Rfc, RfcResult, RfcSnapshot, RfcStatus, StatusChangeRecord, StorageError,
    Subsystem, System, Timestamp, Urgency, User, UserRole,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for RFCs. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct RfcUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub urgency: Option<Urgency>,
    pub status: Option<RfcStatus>,
    pub implementation_date: Option<Timestamp>,
    pub board_card_id: Option<Option<String>>,
    pub board_status_changed_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

/// Update payload for affected-subsystem links.
#[derive(Debug, Clone, Default)]
pub struct AffectedSubsystemUpdate {
    pub confirmation_status: Option<ConfirmationStatus>,
    pub execution_status: Option<ExecutionStatus>,
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage trait for RFC workflow entities.
pub trait StorageTrait: Send + Sync {
    // === RFC Operations ===

    /// Insert a new RFC.
    fn rfc_insert(&self, rfc: &Rfc) -> RfcResult<()>;

    /// Get an RFC by ID.
    fn rfc_get(&self, id: EntityId) -> RfcResult<Option<Rfc>>;

    /// Update an RFC.
    fn rfc_update(&self, id: EntityId, update: RfcUpdate) -> RfcResult<()>;

    /// List all non-deleted RFCs.
    fn rfc_list_active(&self) -> RfcResult<Vec<Rfc>>;

    /// Find an RFC by its bound board card id.
    fn rfc_find_by_card_id(&self, card_id: &str) -> RfcResult<Option<Rfc>>;

    /// Find an RFC by its human-facing sequential number.
    fn rfc_find_by_number(&self, number: i64) -> RfcResult<Option<Rfc>>;

    /// Allocate the next human-facing RFC number.
    fn rfc_next_number(&self) -> i64;

    // === Affected Subsystem Operations ===

    /// Insert a new subsystem link.
    fn link_insert(&self, link: &AffectedSubsystem) -> RfcResult<()>;

    /// Get a subsystem link by ID, regardless of RFC. History resolution
    /// uses this to describe links that were later removed from an RFC.
    fn link_get(&self, link_id: EntityId) -> RfcResult<Option<AffectedSubsystem>>;

    /// Get a subsystem link by ID, scoped to one RFC.
    fn link_get_for_rfc(&self, rfc_id: EntityId, link_id: EntityId)
        -> RfcResult<Option<AffectedSubsystem>>;

    /// List subsystem links for an RFC.
    fn link_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<AffectedSubsystem>>;

    /// Remove a subsystem link (cascade path for RFC updates).
    fn link_remove(&self, link_id: EntityId) -> RfcResult<()>;

    /// Persist a validated status transition together with its history
    /// record, atomically.
    fn record_subsystem_transition(
        &self,
        link_id: EntityId,
        update: AffectedSubsystemUpdate,
        record: StatusChangeRecord,
    ) -> RfcResult<()>;

    // === Approval Operations ===

    /// Find the live approval record for one (RFC, approver) pair.
    fn approval_find(&self, rfc_id: EntityId, approver_id: EntityId)
        -> RfcResult<Option<Approval>>;

    /// Insert or replace an approval record by its ID.
    fn approval_save(&self, approval: &Approval) -> RfcResult<()>;

    /// List approval records for an RFC.
    fn approval_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<Approval>>;

    // === History Operations ===

    /// Append an immutable RFC snapshot.
    fn snapshot_append(&self, snapshot: &RfcSnapshot) -> RfcResult<()>;

    /// List snapshots for an RFC, oldest first.
    fn snapshot_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<RfcSnapshot>>;

    /// List subsystem status records for a set of link ids.
    fn status_record_list_by_links(&self, link_ids: &[EntityId])
        -> RfcResult<Vec<StatusChangeRecord>>;

    /// Persist an RFC mutation together with an optional snapshot,
    /// atomically. This is the write path for status changes that must be
    /// visible as one unit (webhook moves, scheduler updates).
    fn record_rfc_change(&self, rfc: &Rfc, snapshot: Option<RfcSnapshot>) -> RfcResult<()>;

    // === Collaborator Lookups ===

    /// Insert a user record.
    fn user_insert(&self, user: &User) -> RfcResult<()>;

    /// Get a user by ID.
    fn user_get(&self, id: EntityId) -> RfcResult<Option<User>>;

    /// List users holding a role.
    fn user_list_by_role(&self, role: UserRole) -> RfcResult<Vec<User>>;

    /// Find a user by board account id.
    fn user_find_by_board_id(&self, board_user_id: &str) -> RfcResult<Option<User>>;

    /// Find a user by email.
    fn user_find_by_email(&self, email: &str) -> RfcResult<Option<User>>;

    /// Find a user by username.
    fn user_find_by_username(&self, username: &str) -> RfcResult<Option<User>>;

    /// Bind a user to their board account for future webhook attribution.
    fn user_set_board_id(&self, id: EntityId, board_user_id: String) -> RfcResult<()>;

    /// Insert a system.
    fn system_insert(&self, system: &System) -> RfcResult<()>;

    /// Get a system by ID.
    fn system_get(&self, id: EntityId) -> RfcResult<Option<System>>;

    /// Insert a subsystem.
    fn subsystem_insert(&self, subsystem: &Subsystem) -> RfcResult<()>;

    /// Get a subsystem by ID.
    fn subsystem_get(&self, id: EntityId) -> RfcResult<Option<Subsystem>>;

    /// Insert an attachment record.
    fn attachment_insert(&self, attachment: &Attachment) -> RfcResult<()>;

    /// Get an attachment by ID.
    fn attachment_get(&self, id: EntityId) -> RfcResult<Option<Attachment>>;

    /// List attachments for an RFC.
    fn attachment_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<Attachment>>;
}

// ============================================================================
// IN-MEMORY STORAGE
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    rfcs: HashMap<Uuid, Rfc>,
    links: HashMap<Uuid, AffectedSubsystem>,
    approvals: HashMap<Uuid, Approval>,
    snapshots: HashMap<Uuid, RfcSnapshot>,
    status_records: HashMap<Uuid, StatusChangeRecord>,
    users: HashMap<Uuid, User>,
    systems: HashMap<Uuid, System>,
    subsystems: HashMap<Uuid, Subsystem>,
    attachments: HashMap<Uuid, Attachment>,
}

/// In-memory storage. All tables live behind one lock so every trait call
/// is atomic with respect to every other.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: RwLock<Inner>,
    rfc_counter: AtomicI64,
}

impl InMemoryStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            *inner = Inner::default();
        }
    }

    /// Get count of stored RFCs.
    pub fn rfc_count(&self) -> usize {
        self.inner.read().map(|i| i.rfcs.len()).unwrap_or(0)
    }

    /// Get count of stored snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.inner.read().map(|i| i.snapshots.len()).unwrap_or(0)
    }

    /// Get count of stored status-change records.
    pub fn status_record_count(&self) -> usize {
        self.inner.read().map(|i| i.status_records.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StorageError> {
        self.inner.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StorageError> {
        self.inner.write().map_err(|_| StorageError::LockPoisoned)
    }
}

fn insert_unique<T: Clone>(
    map: &mut HashMap<Uuid, T>,
    id: Uuid,
    value: &T,
    entity: EntityKind,
) -> Result<(), StorageError> {
    if map.contains_key(&id) {
        return Err(StorageError::InsertFailed {
            entity,
            reason: "already exists".to_string(),
        });
    }
    map.insert(id, value.clone());
    Ok(())
}

impl StorageTrait for InMemoryStorage {
    // === RFC Operations ===

    fn rfc_insert(&self, rfc: &Rfc) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.rfcs, rfc.id, rfc, EntityKind::Rfc)?;
        Ok(())
    }

    fn rfc_get(&self, id: EntityId) -> RfcResult<Option<Rfc>> {
        let inner = self.read()?;
        Ok(inner.rfcs.get(&id).cloned())
    }

    fn rfc_update(&self, id: EntityId, update: RfcUpdate) -> RfcResult<()> {
        let mut inner = self.write()?;
        let rfc = inner.rfcs.get_mut(&id).ok_or(StorageError::NotFound {
            entity: EntityKind::Rfc,
            id,
        })?;

        if let Some(title) = update.title {
            rfc.title = title;
        }
        if let Some(description) = update.description {
            rfc.description = Some(description);
        }
        if let Some(urgency) = update.urgency {
            rfc.urgency = urgency;
        }
        if let Some(status) = update.status {
            rfc.status = status;
        }
        if let Some(implementation_date) = update.implementation_date {
            rfc.implementation_date = implementation_date;
        }
        if let Some(board_card_id) = update.board_card_id {
            rfc.board_card_id = board_card_id;
        }
        if let Some(stamp) = update.board_status_changed_at {
            rfc.board_status_changed_at = Some(stamp);
        }
        if let Some(deleted_at) = update.deleted_at {
            rfc.deleted_at = Some(deleted_at);
        }
        rfc.updated_at = chrono::Utc::now();

        Ok(())
    }

    fn rfc_list_active(&self) -> RfcResult<Vec<Rfc>> {
        let inner = self.read()?;
        let mut rfcs: Vec<Rfc> = inner
            .rfcs
            .values()
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect();
        rfcs.sort_by_key(|r| r.number);
        Ok(rfcs)
    }

    fn rfc_find_by_card_id(&self, card_id: &str) -> RfcResult<Option<Rfc>> {
        let inner = self.read()?;
        Ok(inner
            .rfcs
            .values()
            .find(|r| r.board_card_id.as_deref() == Some(card_id))
            .cloned())
    }

    fn rfc_find_by_number(&self, number: i64) -> RfcResult<Option<Rfc>> {
        let inner = self.read()?;
        Ok(inner.rfcs.values().find(|r| r.number == number).cloned())
    }

    fn rfc_next_number(&self) -> i64 {
        self.rfc_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    // === Affected Subsystem Operations ===

    fn link_insert(&self, link: &AffectedSubsystem) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.links, link.id, link, EntityKind::AffectedSubsystem)?;
        Ok(())
    }

    fn link_get(&self, link_id: EntityId) -> RfcResult<Option<AffectedSubsystem>> {
        let inner = self.read()?;
        Ok(inner.links.get(&link_id).cloned())
    }

    fn link_get_for_rfc(
        &self,
        rfc_id: EntityId,
        link_id: EntityId,
    ) -> RfcResult<Option<AffectedSubsystem>> {
        let inner = self.read()?;
        Ok(inner
            .links
            .get(&link_id)
            .filter(|l| l.rfc_id == rfc_id)
            .cloned())
    }

    fn link_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<AffectedSubsystem>> {
        let inner = self.read()?;
        let mut links: Vec<AffectedSubsystem> = inner
            .links
            .values()
            .filter(|l| l.rfc_id == rfc_id)
            .cloned()
            .collect();
        links.sort_by_key(|l| (l.created_at, l.id));
        Ok(links)
    }

    fn link_remove(&self, link_id: EntityId) -> RfcResult<()> {
        let mut inner = self.write()?;
        inner.links.remove(&link_id);
        Ok(())
    }

    fn record_subsystem_transition(
        &self,
        link_id: EntityId,
        update: AffectedSubsystemUpdate,
        record: StatusChangeRecord,
    ) -> RfcResult<()> {
        let mut inner = self.write()?;
        let link = inner.links.get_mut(&link_id).ok_or(StorageError::NotFound {
            entity: EntityKind::AffectedSubsystem,
            id: link_id,
        })?;

        if let Some(confirmation) = update.confirmation_status {
            link.confirmation_status = confirmation;
        }
        if let Some(execution) = update.execution_status {
            link.execution_status = execution;
        }
        link.updated_at = chrono::Utc::now();

        inner.status_records.insert(record.id, record);
        Ok(())
    }

    // === Approval Operations ===

    fn approval_find(
        &self,
        rfc_id: EntityId,
        approver_id: EntityId,
    ) -> RfcResult<Option<Approval>> {
        let inner = self.read()?;
        Ok(inner
            .approvals
            .values()
            .find(|a| a.rfc_id == rfc_id && a.approver_id == approver_id)
            .cloned())
    }

    fn approval_save(&self, approval: &Approval) -> RfcResult<()> {
        let mut inner = self.write()?;
        inner.approvals.insert(approval.id, approval.clone());
        Ok(())
    }

    fn approval_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<Approval>> {
        let inner = self.read()?;
        let mut approvals: Vec<Approval> = inner
            .approvals
            .values()
            .filter(|a| a.rfc_id == rfc_id)
            .cloned()
            .collect();
        approvals.sort_by_key(|a| (a.created_at, a.id));
        Ok(approvals)
    }

    // === History Operations ===

    fn snapshot_append(&self, snapshot: &RfcSnapshot) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.snapshots, snapshot.id, snapshot, EntityKind::RfcSnapshot)?;
        Ok(())
    }

    fn snapshot_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<RfcSnapshot>> {
        let inner = self.read()?;
        let mut snapshots: Vec<RfcSnapshot> = inner
            .snapshots
            .values()
            .filter(|s| s.rfc_id == rfc_id)
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| (s.created_at, s.id));
        Ok(snapshots)
    }

    fn status_record_list_by_links(
        &self,
        link_ids: &[EntityId],
    ) -> RfcResult<Vec<StatusChangeRecord>> {
        let ids: BTreeSet<EntityId> = link_ids.iter().copied().collect();
        let inner = self.read()?;
        let mut records: Vec<StatusChangeRecord> = inner
            .status_records
            .values()
            .filter(|r| ids.contains(&r.affected_subsystem_id))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.created_at, r.id));
        Ok(records)
    }

    fn record_rfc_change(&self, rfc: &Rfc, snapshot: Option<RfcSnapshot>) -> RfcResult<()> {
        let mut inner = self.write()?;
        if !inner.rfcs.contains_key(&rfc.id) {
            return Err(StorageError::NotFound {
                entity: EntityKind::Rfc,
                id: rfc.id,
            }
            .into());
        }
        inner.rfcs.insert(rfc.id, rfc.clone());
        if let Some(snapshot) = snapshot {
            inner.snapshots.insert(snapshot.id, snapshot);
        }
        Ok(())
    }

    // === Collaborator Lookups ===

    fn user_insert(&self, user: &User) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.users, user.id, user, EntityKind::User)?;
        Ok(())
    }

    fn user_get(&self, id: EntityId) -> RfcResult<Option<User>> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).cloned())
    }

    fn user_list_by_role(&self, role: UserRole) -> RfcResult<Vec<User>> {
        let inner = self.read()?;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    fn user_find_by_board_id(&self, board_user_id: &str) -> RfcResult<Option<User>> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.board_user_id.as_deref() == Some(board_user_id))
            .cloned())
    }

    fn user_find_by_email(&self, email: &str) -> RfcResult<Option<User>> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn user_find_by_username(&self, username: &str) -> RfcResult<Option<User>> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn user_set_board_id(&self, id: EntityId, board_user_id: String) -> RfcResult<()> {
        let mut inner = self.write()?;
        let user = inner.users.get_mut(&id).ok_or(StorageError::NotFound {
            entity: EntityKind::User,
            id,
        })?;
        user.board_user_id = Some(board_user_id);
        Ok(())
    }

    fn system_insert(&self, system: &System) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.systems, system.id, system, EntityKind::System)?;
        Ok(())
    }

    fn system_get(&self, id: EntityId) -> RfcResult<Option<System>> {
        let inner = self.read()?;
        Ok(inner.systems.get(&id).cloned())
    }

    fn subsystem_insert(&self, subsystem: &Subsystem) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(&mut inner.subsystems, subsystem.id, subsystem, EntityKind::Subsystem)?;
        Ok(())
    }

    fn subsystem_get(&self, id: EntityId) -> RfcResult<Option<Subsystem>> {
        let inner = self.read()?;
        Ok(inner.subsystems.get(&id).cloned())
    }

    fn attachment_insert(&self, attachment: &Attachment) -> RfcResult<()> {
        let mut inner = self.write()?;
        insert_unique(
            &mut inner.attachments,
            attachment.id,
            attachment,
            EntityKind::Attachment,
        )?;
        Ok(())
    }

    fn attachment_get(&self, id: EntityId) -> RfcResult<Option<Attachment>> {
        let inner = self.read()?;
        Ok(inner.attachments.get(&id).cloned())
    }

    fn attachment_list_by_rfc(&self, rfc_id: EntityId) -> RfcResult<Vec<Attachment>> {
        let inner = self.read()?;
        let mut attachments: Vec<Attachment> = inner
            .attachments
            .values()
            .filter(|a| a.rfc_id == rfc_id)
            .cloned()
            .collect();
        attachments.sort_by_key(|a| a.id);
        Ok(attachments)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rfc_core::{new_entity_id, RfcError, StatusAxis};

    fn sample_rfc(number: i64) -> Rfc {
        let now = Utc::now();
        Rfc {
            id: new_entity_id(),
            number,
            title: "Rotate TLS certificates".to_string(),
            description: None,
            urgency: Urgency::Planned,
            status: RfcStatus::New,
            implementation_date: now,
            requester_id: new_entity_id(),
            board_card_id: None,
            board_status_changed_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_link(rfc_id: EntityId) -> AffectedSubsystem {
        let now = Utc::now();
        AffectedSubsystem {
            id: new_entity_id(),
            rfc_id,
            subsystem_id: new_entity_id(),
            executor_id: new_entity_id(),
            confirmation_status: ConfirmationStatus::Pending,
            execution_status: ExecutionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rfc_insert_get_roundtrip() {
        let store = InMemoryStorage::new();
        let rfc = sample_rfc(1);
        store.rfc_insert(&rfc).unwrap();

        let fetched = store.rfc_get(rfc.id).unwrap().unwrap();
        assert_eq!(fetched, rfc);
    }

    #[test]
    fn test_rfc_double_insert_fails() {
        let store = InMemoryStorage::new();
        let rfc = sample_rfc(1);
        store.rfc_insert(&rfc).unwrap();

        let err = store.rfc_insert(&rfc).unwrap_err();
        assert!(matches!(
            err,
            RfcError::Storage(StorageError::InsertFailed { .. })
        ));
    }

    #[test]
    fn test_rfc_update_missing_fails() {
        let store = InMemoryStorage::new();
        let err = store
            .rfc_update(new_entity_id(), RfcUpdate::default())
            .unwrap_err();
        assert!(matches!(
            err,
            RfcError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_rfc_list_active_excludes_deleted() {
        let store = InMemoryStorage::new();
        let live = sample_rfc(1);
        let mut dead = sample_rfc(2);
        dead.deleted_at = Some(Utc::now());
        store.rfc_insert(&live).unwrap();
        store.rfc_insert(&dead).unwrap();

        let active = store.rfc_list_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, live.id);
    }

    #[test]
    fn test_rfc_find_by_card_and_number() {
        let store = InMemoryStorage::new();
        let mut rfc = sample_rfc(7);
        rfc.board_card_id = Some("card-42".to_string());
        store.rfc_insert(&rfc).unwrap();

        assert_eq!(
            store.rfc_find_by_card_id("card-42").unwrap().unwrap().id,
            rfc.id
        );
        assert!(store.rfc_find_by_card_id("card-43").unwrap().is_none());
        assert_eq!(store.rfc_find_by_number(7).unwrap().unwrap().id, rfc.id);
    }

    #[test]
    fn test_rfc_number_allocation_is_monotonic() {
        let store = InMemoryStorage::new();
        let first = store.rfc_next_number();
        let second = store.rfc_next_number();
        assert!(second > first);
    }

    #[test]
    fn test_link_scoped_to_rfc() {
        let store = InMemoryStorage::new();
        let rfc = sample_rfc(1);
        store.rfc_insert(&rfc).unwrap();
        let link = sample_link(rfc.id);
        store.link_insert(&link).unwrap();

        assert!(store.link_get_for_rfc(rfc.id, link.id).unwrap().is_some());
        assert!(store
            .link_get_for_rfc(new_entity_id(), link.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_record_subsystem_transition_updates_and_appends() {
        let store = InMemoryStorage::new();
        let rfc = sample_rfc(1);
        store.rfc_insert(&rfc).unwrap();
        let link = sample_link(rfc.id);
        store.link_insert(&link).unwrap();

        let record = StatusChangeRecord {
            id: new_entity_id(),
            affected_subsystem_id: link.id,
            axis: StatusAxis::Confirmation,
            old_status: Some("PENDING".to_string()),
            new_status: "CONFIRMED".to_string(),
            changed_by: link.executor_id,
            created_at: Utc::now(),
        };
        store
            .record_subsystem_transition(
                link.id,
                AffectedSubsystemUpdate {
                    confirmation_status: Some(ConfirmationStatus::Confirmed),
                    execution_status: None,
                },
                record,
            )
            .unwrap();

        let updated = store.link_get_for_rfc(rfc.id, link.id).unwrap().unwrap();
        assert_eq!(updated.confirmation_status, ConfirmationStatus::Confirmed);
        assert_eq!(updated.execution_status, ExecutionStatus::Pending);

        let records = store.status_record_list_by_links(&[link.id]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].new_status, "CONFIRMED");
    }

    #[test]
    fn test_approval_save_replaces_by_id() {
        let store = InMemoryStorage::new();
        let rfc = sample_rfc(1);
        store.rfc_insert(&rfc).unwrap();

        let now = Utc::now();
        let mut approval = Approval {
            id: new_entity_id(),
            rfc_id: rfc.id,
            approver_id: new_entity_id(),
            approved: true,
            comment: None,
            created_at: now,
            updated_at: now,
        };
        store.approval_save(&approval).unwrap();

        approval.approved = false;
        store.approval_save(&approval).unwrap();

        let approvals = store.approval_list_by_rfc(rfc.id).unwrap();
        assert_eq!(approvals.len(), 1);
        assert!(!approvals[0].approved);
    }

    #[test]
    fn test_record_rfc_change_requires_existing_rfc() {
        let store = InMemoryStorage::new();
        let rfc = sample_rfc(1);
        let err = store.record_rfc_change(&rfc, None).unwrap_err();
        assert!(matches!(
            err,
            RfcError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_user_lookup_paths() {
        let store = InMemoryStorage::new();
        let user = User {
            id: new_entity_id(),
            username: "jlee".to_string(),
            full_name: "Jordan Lee".to_string(),
            email: "jlee@example.com".to_string(),
            role: UserRole::RfcApprover,
            board_user_id: None,
        };
        store.user_insert(&user).unwrap();

        assert!(store.user_find_by_email("JLEE@example.com").unwrap().is_some());
        assert!(store.user_find_by_username("jlee").unwrap().is_some());
        assert!(store.user_find_by_board_id("b1").unwrap().is_none());

        store.user_set_board_id(user.id, "b1".to_string()).unwrap();
        assert_eq!(
            store.user_find_by_board_id("b1").unwrap().unwrap().id,
            user.id
        );

        let approvers = store.user_list_by_role(UserRole::RfcApprover).unwrap();
        assert_eq!(approvers.len(), 1);
    }
}
